//! ASCII armor around the binary wire message.
//!
//! ```text
//! -----BEGIN PGP MESSAGE-----
//! Comment: courier-envelope
//!
//! <base64 body, 64 columns>
//! =<base64 CRC-24>
//! -----END PGP MESSAGE-----
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::DecryptionError;

pub const BEGIN_LINE: &str = "-----BEGIN PGP MESSAGE-----";
pub const END_LINE: &str = "-----END PGP MESSAGE-----";
pub const COMMENT: &str = "courier-envelope";

const LINE_WIDTH: usize = 64;
const CRC24_INIT: u32 = 0x00B7_04CE;
const CRC24_POLY: u32 = 0x0186_4CFB;

/// Structural check only: begin line first, end line last.
///
/// Never parses the body. This is the whole validation a server holding
/// no passphrase can do.
pub fn is_armored(content: &str) -> bool {
    !content.is_empty()
        && content.starts_with(BEGIN_LINE)
        && content.trim_end().ends_with(END_LINE)
}

/// RFC 4880 CRC-24.
pub fn crc24(data: &[u8]) -> u32 {
    let mut crc = CRC24_INIT;
    for &byte in data {
        crc ^= (byte as u32) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24_POLY;
            }
        }
    }
    crc & 0x00FF_FFFF
}

fn checksum_line(body: &[u8]) -> String {
    let crc = crc24(body).to_be_bytes();
    format!("={}", STANDARD.encode(&crc[1..]))
}

pub fn encode(body: &[u8]) -> String {
    let b64 = STANDARD.encode(body);
    let mut out = String::with_capacity(b64.len() + b64.len() / LINE_WIDTH + 128);

    out.push_str(BEGIN_LINE);
    out.push('\n');
    out.push_str("Comment: ");
    out.push_str(COMMENT);
    out.push_str("\n\n");

    // base64 output is ASCII, so byte chunks are valid char boundaries
    for chunk in b64.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(core::str::from_utf8(chunk).unwrap_or_default());
        out.push('\n');
    }

    out.push_str(&checksum_line(body));
    out.push('\n');
    out.push_str(END_LINE);
    out.push('\n');
    out
}

pub fn decode(text: &str) -> Result<Vec<u8>, DecryptionError> {
    let mut lines = text.trim().lines().map(str::trim_end).peekable();

    if lines.next() != Some(BEGIN_LINE) {
        return Err(DecryptionError::InvalidMessage);
    }

    // Optional "Key: Value" block, closed by an empty line.
    if lines.peek().is_some_and(|l| is_header_line(l)) {
        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            if !is_header_line(line) {
                return Err(DecryptionError::InvalidMessage);
            }
        }
    } else if lines.peek() == Some(&"") {
        lines.next();
    }

    let mut b64 = String::new();
    let mut checksum = None;
    let mut closed = false;

    for line in lines.by_ref() {
        if line == END_LINE {
            closed = true;
            break;
        }
        if let Some(sum) = line.strip_prefix('=') {
            if checksum.is_some() {
                return Err(DecryptionError::InvalidMessage);
            }
            checksum = Some(sum.to_owned());
            continue;
        }
        if checksum.is_some() {
            // body after the checksum line
            return Err(DecryptionError::InvalidMessage);
        }
        b64.push_str(line.trim_start());
    }

    if !closed || lines.next().is_some() {
        return Err(DecryptionError::InvalidMessage);
    }

    let body = STANDARD
        .decode(b64.as_bytes())
        .map_err(|_| DecryptionError::InvalidMessage)?;

    let sum = checksum.ok_or(DecryptionError::InvalidMessage)?;
    let crc = STANDARD
        .decode(sum.as_bytes())
        .map_err(|_| DecryptionError::InvalidMessage)?;
    if crc.len() != 3 || crc[..] != crc24(&body).to_be_bytes()[1..] {
        return Err(DecryptionError::InvalidMessage);
    }

    Ok(body)
}

fn is_header_line(line: &str) -> bool {
    match line.split_once(": ") {
        Some((key, _)) => !key.is_empty() && !key.contains(char::is_whitespace),
        None => false,
    }
}
