//! Passphrase envelope: seal plaintext into armored text and open it again.

use std::io::Read;
use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use zeroize::Zeroizing;

use crate::error::{DecryptionError, EncodingError};
use crate::kdf::{self, KdfParams};
use crate::wire::{self, WireHeader, FLAG_BINARY};
use crate::{aead, armor};

/// Length of a generated passphrase.
pub const GENERATED_KEY_LEN: usize = 22;

/// Plaintext recovered from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub content: Vec<u8>,
    /// Set only when the sender encrypted a named file.
    pub filename: Option<String>,
}

impl Decrypted {
    /// Content as text, replacing invalid UTF-8 sequences.
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Envelope codec with a fixed KDF cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct Envelope {
    kdf: KdfParams,
}

impl Envelope {
    /// Codec with Argon2 default cost.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with explicit KDF cost. Only affects sealing; opening always
    /// uses the cost recorded in the envelope.
    pub fn with_kdf(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    /// Seal free text.
    pub fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<String, EncodingError> {
        self.seal(plaintext, passphrase, None)
    }

    /// Seal file contents, embedding the file name.
    pub fn encrypt_file(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        filename: &str,
    ) -> Result<String, EncodingError> {
        self.seal(plaintext, passphrase, Some(filename))
    }

    /// Read a file from disk and seal it under its own file name.
    pub fn encrypt_path(
        &self,
        path: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<String, EncodingError> {
        if passphrase.is_empty() {
            return Err(EncodingError::EmptyKey);
        }
        let path = path.as_ref();
        let data = Zeroizing::new(
            std::fs::read(path).map_err(|e| EncodingError::Io(e.to_string()))?,
        );
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.seal(&data, passphrase, Some(&name))
    }

    /// Open an envelope with a known passphrase.
    pub fn decrypt(
        &self,
        reader: impl Read,
        passphrase: &str,
    ) -> Result<Decrypted, DecryptionError> {
        self.decrypt_with(reader, || passphrase.to_owned())
    }

    /// Open an envelope, asking `prompt` for the passphrase.
    ///
    /// `prompt` runs only once the framing has been validated, and never
    /// more than once: a wrong passphrase fails immediately.
    pub fn decrypt_with<F>(&self, mut reader: impl Read, prompt: F) -> Result<Decrypted, DecryptionError>
    where
        F: FnOnce() -> String,
    {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|_| DecryptionError::InvalidMessage)?;

        let body = armor::decode(&text)?;
        let parts = wire::decode_wire(&body)?;

        let passphrase = Zeroizing::new(prompt());
        let params = KdfParams::new(parts.m_cost_kib, parts.t_cost, parts.p_cost);
        let key = kdf::derive_key(passphrase.as_bytes(), parts.salt, params)
            .map_err(|_| DecryptionError::InvalidMessage)?;

        let content = aead::aead_open(&key, parts.nonce, parts.aead_ciphertext, parts.header)?;
        let filename = parts.is_binary().then(|| parts.filename.to_owned());

        Ok(Decrypted { content, filename })
    }

    fn seal(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        filename: Option<&str>,
    ) -> Result<String, EncodingError> {
        if passphrase.is_empty() {
            return Err(EncodingError::EmptyKey);
        }

        let salt = aead::salt()?;
        let nonce = aead::nonce()?;
        let header = wire::encode_header(&WireHeader {
            flags: if filename.is_some() { FLAG_BINARY } else { 0 },
            m_cost_kib: self.kdf.m_cost_kib,
            t_cost: self.kdf.t_cost,
            p_cost: self.kdf.p_cost,
            salt: &salt,
            nonce: &nonce,
            filename: filename.unwrap_or_default(),
        })?;

        let key = kdf::derive_key(passphrase.as_bytes(), &salt, self.kdf)
            .map_err(|_| EncodingError::Cipher)?;
        let aead_ct = aead::aead_seal(&key, &nonce, plaintext, &header)?;

        Ok(armor::encode(&wire::encode_wire(header, &aead_ct)))
    }
}

/// Random URL-safe passphrase of [`GENERATED_KEY_LEN`] characters.
pub fn generate_key() -> Result<String, EncodingError> {
    let bytes: [u8; GENERATED_KEY_LEN] = aead::random()?;
    let mut encoded = URL_SAFE.encode(bytes);
    encoded.truncate(GENERATED_KEY_LEN);
    Ok(encoded)
}
