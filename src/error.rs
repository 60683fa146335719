//! Error types for the envelope codec.

use core::fmt;

/// Failure while producing an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The passphrase was empty.
    EmptyKey,
    /// The embedded filename does not fit the one-byte length prefix.
    FilenameTooLong,
    /// The OS random source failed.
    Entropy,
    /// The cipher refused the input.
    Cipher,
    /// Reading the plaintext source failed.
    Io(String),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "empty encryption key"),
            Self::FilenameTooLong => write!(f, "filename too long"),
            Self::Entropy => write!(f, "random source unavailable"),
            Self::Cipher => write!(f, "could not encrypt"),
            Self::Io(msg) => write!(f, "could not read plaintext: {}", msg),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Failure while opening an envelope.
///
/// Exactly two outcomes are distinguishable: the input was not an envelope
/// at all, or it was one and the passphrase did not open it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionError {
    /// Armor, checksum or wire framing is malformed.
    InvalidMessage,
    /// Framing is fine but authentication failed under the given passphrase.
    InvalidKey,
}

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMessage => write!(f, "invalid message"),
            Self::InvalidKey => write!(f, "could not decrypt: invalid decryption key"),
        }
    }
}

impl std::error::Error for DecryptionError {}
