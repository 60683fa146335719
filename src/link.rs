//! Shareable links: `<base>/#/<mode>/<id>[/<key>]`.
//!
//! | mode | file | manual key |
//! |------|------|------------|
//! | `s`  | no   | no         |
//! | `c`  | no   | yes        |
//! | `f`  | yes  | no         |
//! | `d`  | yes  | yes        |
//!
//! With a manual key the passphrase is not part of the link and travels
//! out of band.
//!
//! The id and key segments are percent-encoded, so any UTF-8 passphrase
//! survives the round trip.

use core::fmt;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    Text,
    TextManualKey,
    File,
    FileManualKey,
}

impl LinkMode {
    pub fn new(file: bool, manual_key: bool) -> Self {
        match (file, manual_key) {
            (false, false) => Self::Text,
            (false, true) => Self::TextManualKey,
            (true, false) => Self::File,
            (true, true) => Self::FileManualKey,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Text),
            'c' => Some(Self::TextManualKey),
            'f' => Some(Self::File),
            'd' => Some(Self::FileManualKey),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Text => 's',
            Self::TextManualKey => 'c',
            Self::File => 'f',
            Self::FileManualKey => 'd',
        }
    }

    pub fn is_file(self) -> bool {
        matches!(self, Self::File | Self::FileManualKey)
    }

    pub fn is_manual_key(self) -> bool {
        matches!(self, Self::TextManualKey | Self::FileManualKey)
    }
}

/// Decoded link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub mode: LinkMode,
    pub id: String,
    /// Decryption passphrase, when the link carries one.
    pub key: Option<String>,
}

impl Link {
    pub fn is_file(&self) -> bool {
        self.mode.is_file()
    }

    pub fn is_manual_key(&self) -> bool {
        self.mode.is_manual_key()
    }

    /// Render under `base`. The key segment is dropped for manual-key modes.
    pub fn to_url(&self, base: &str) -> String {
        let base = base.strip_suffix('/').unwrap_or(base);
        let id = urlencoding::encode(&self.id);
        match (&self.key, self.mode.is_manual_key()) {
            (Some(key), false) => format!(
                "{}/#/{}/{}/{}",
                base,
                self.mode.as_char(),
                id,
                urlencoding::encode(key)
            ),
            _ => format!("{}/#/{}/{}", base, self.mode.as_char(), id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Not an absolute URL.
    InvalidUrl(String),
    /// The fragment is not `/<mode>/<id>[/<key>]`.
    UnexpectedFormat(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(msg) => write!(f, "invalid URL: {}", msg),
            Self::UnexpectedFormat(url) => write!(f, "unexpected URL: {:?}", url),
        }
    }
}

impl std::error::Error for LinkError {}

/// Build a link for a stored secret.
pub fn format_link(base: &str, id: &str, key: &str, file: bool, manual_key: bool) -> String {
    Link {
        mode: LinkMode::new(file, manual_key),
        id: id.to_owned(),
        key: Some(key.to_owned()),
    }
    .to_url(base)
}

/// Parse a link produced by [`format_link`].
pub fn parse_link(input: &str) -> Result<Link, LinkError> {
    let input = input.trim();
    let url = Url::parse(input).map_err(|e| LinkError::InvalidUrl(e.to_string()))?;
    let unexpected = || LinkError::UnexpectedFormat(input.to_owned());

    let segments: Vec<&str> = url.fragment().unwrap_or_default().split('/').collect();
    if !(3..=4).contains(&segments.len()) || !segments[0].is_empty() {
        return Err(unexpected());
    }

    let mut mode_chars = segments[1].chars();
    let mode = match (mode_chars.next(), mode_chars.next()) {
        (Some(c), None) => LinkMode::from_char(c).ok_or_else(unexpected)?,
        _ => return Err(unexpected()),
    };

    // `Url` hands back the fragment still percent-encoded.
    let decode = |seg: &str| {
        urlencoding::decode(seg)
            .map(|s| s.into_owned())
            .map_err(|_| unexpected())
    };

    let id = decode(segments[2])?;
    let key = match segments.get(3) {
        Some(k) if !k.is_empty() => Some(decode(k)?),
        _ => None,
    };

    Ok(Link { mode, id, key })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "5d7a2e90-0b59-4b3c-9c0f-2a4f3c8e2d11";

    #[test]
    fn format_embeds_key() {
        assert_eq!(
            format_link("https://example.com", ID, "k3y", false, false),
            format!("https://example.com/#/s/{ID}/k3y")
        );
        assert_eq!(
            format_link("https://example.com/", ID, "k3y", true, false),
            format!("https://example.com/#/f/{ID}/k3y")
        );
    }

    #[test]
    fn format_manual_key_drops_key() {
        assert_eq!(
            format_link("https://example.com", ID, "k3y", false, true),
            format!("https://example.com/#/c/{ID}")
        );
        assert_eq!(
            format_link("https://example.com", ID, "k3y", true, true),
            format!("https://example.com/#/d/{ID}")
        );
    }

    #[test]
    fn mode_table() {
        for (c, file, manual) in [('s', false, false), ('c', false, true), ('f', true, false), ('d', true, true)] {
            let mode = LinkMode::from_char(c).unwrap();
            assert_eq!(mode, LinkMode::new(file, manual));
            assert_eq!(mode.as_char(), c);
            assert_eq!(mode.is_file(), file);
            assert_eq!(mode.is_manual_key(), manual);
        }
        assert_eq!(LinkMode::from_char('x'), None);
    }

    #[test]
    fn parse_with_key() {
        let link = parse_link(&format!("https://example.com/#/s/{ID}/k3y")).unwrap();
        assert_eq!(link.id, ID);
        assert_eq!(link.key.as_deref(), Some("k3y"));
        assert!(!link.is_file());
        assert!(!link.is_manual_key());
    }

    #[test]
    fn parse_manual_key() {
        let link = parse_link(&format!("  https://example.com/#/d/{ID}\n")).unwrap();
        assert_eq!(link.key, None);
        assert!(link.is_file());
        assert!(link.is_manual_key());
    }

    #[test]
    fn parse_rejects_bad_fragments() {
        for bad in [
            "https://example.com/",
            "https://example.com/#/s",
            "https://example.com/#s/id/key",
            "https://example.com/#/x/id/key",
            "https://example.com/#/ss/id/key",
            "https://example.com/#/s/id/key/extra",
        ] {
            assert!(
                matches!(parse_link(bad), Err(LinkError::UnexpectedFormat(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn key_with_reserved_characters_roundtrips() {
        for key in ["correct horse", "pässwörd", "50%/off#?", "🔑 tab\there"] {
            let url = format_link("https://example.com", ID, key, false, false);
            assert!(!url[url.find('#').unwrap() + 1..].contains(' '), "{url}");
            let link = parse_link(&url).unwrap();
            assert_eq!(link.key.as_deref(), Some(key), "{url}");
            assert_eq!(link.id, ID);
        }
    }

    #[test]
    fn parse_decodes_escaped_segments() {
        let link = parse_link(&format!("https://example.com/#/s/{ID}/correct%20horse")).unwrap();
        assert_eq!(link.key.as_deref(), Some("correct horse"));

        // Percent escapes that are not UTF-8.
        assert!(matches!(
            parse_link(&format!("https://example.com/#/s/{ID}/%FF%FE")),
            Err(LinkError::UnexpectedFormat(_))
        ));
    }

    #[test]
    fn parse_rejects_relative_url() {
        assert!(matches!(parse_link("/#/s/id/key"), Err(LinkError::InvalidUrl(_))));
    }
}
