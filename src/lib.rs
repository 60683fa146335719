//! # Courier Envelope
//!
//! Passphrase encryption for secrets that are shared once.
//!
//! ## Quick Start
//!
//! ```rust
//! use courier_envelope::{decrypt, encrypt, generate_key};
//!
//! let key = generate_key().unwrap();
//! let armored = encrypt(b"secret", &key).unwrap();
//!
//! let opened = decrypt(armored.as_bytes(), &key).unwrap();
//! assert_eq!(opened.content, b"secret");
//! assert_eq!(opened.filename, None);
//! ```
//!
//! ## Security Properties
//!
//! - **Argon2id + AES-256-GCM**: passphrase-derived key, authenticated encryption
//! - **Self-framing**: armor checksum and wire header are checked before any key work
//! - **Two error kinds**: malformed input vs. wrong passphrase, nothing finer
//! - **No compression**: plaintext length leaks, plaintext content does not
//!
//! ## What's NOT Provided
//!
//! - Interoperability with OpenPGP implementations (only the armor lines match)
//! - Streaming encryption
//! - Public-key recipients

#![deny(unsafe_code)]

mod aead;
mod error;
mod kdf;

#[doc(hidden)]
pub mod armor;
pub mod envelope;
pub mod link;
#[doc(hidden)]
pub mod wire;

use std::io::Read;
use std::path::Path;

pub use armor::is_armored;
pub use envelope::{generate_key, Decrypted, Envelope, GENERATED_KEY_LEN};
pub use error::{DecryptionError, EncodingError};
pub use kdf::KdfParams;
pub use link::{format_link, parse_link, Link, LinkError, LinkMode};

/// Seal free text under `passphrase` with default KDF cost.
pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<String, EncodingError> {
    Envelope::default().encrypt(plaintext, passphrase)
}

/// Seal file contents, embedding `filename` in the envelope.
pub fn encrypt_file(
    plaintext: &[u8],
    passphrase: &str,
    filename: &str,
) -> Result<String, EncodingError> {
    Envelope::default().encrypt_file(plaintext, passphrase, filename)
}

/// Read `path` and seal it under its own file name.
pub fn encrypt_path(path: impl AsRef<Path>, passphrase: &str) -> Result<String, EncodingError> {
    Envelope::default().encrypt_path(path, passphrase)
}

/// Open an armored envelope.
pub fn decrypt(reader: impl Read, passphrase: &str) -> Result<Decrypted, DecryptionError> {
    Envelope::default().decrypt(reader, passphrase)
}

/// Open an armored envelope, asking `prompt` once for the passphrase.
pub fn decrypt_with<F>(reader: impl Read, prompt: F) -> Result<Decrypted, DecryptionError>
where
    F: FnOnce() -> String,
{
    Envelope::default().decrypt_with(reader, prompt)
}
