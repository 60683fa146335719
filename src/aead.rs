//! AEAD: AES-256-GCM

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;

use crate::error::{DecryptionError, EncodingError};
use crate::wire::{AES_KEY_BYTES, NONCE_BYTES, SALT_BYTES};

/// Fill a fixed-size buffer from the OS random source.
pub fn random<const N: usize>() -> Result<[u8; N], EncodingError> {
    let mut n = [0u8; N];
    getrandom(&mut n).map_err(|_| EncodingError::Entropy)?;
    Ok(n)
}

/// Generate a random 12-byte nonce. Used during encryption only.
pub fn nonce() -> Result<[u8; NONCE_BYTES], EncodingError> {
    random()
}

/// Generate a random KDF salt.
pub fn salt() -> Result<[u8; SALT_BYTES], EncodingError> {
    random()
}

/// AEAD seal (encrypt path). Returns EncodingError on failure.
pub fn aead_seal(
    key: &[u8; AES_KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncodingError::Cipher)?;
    let n = Nonce::from_slice(nonce);
    let payload = Payload { msg: plaintext, aad };
    cipher.encrypt(n, payload).map_err(|_| EncodingError::Cipher)
}

/// AEAD open (decrypt path). Any failure means the key did not fit.
pub fn aead_open(
    key: &[u8; AES_KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| DecryptionError::InvalidKey)?;
    let n = Nonce::from_slice(nonce);
    let payload = Payload { msg: ciphertext, aad };
    cipher.decrypt(n, payload).map_err(|_| DecryptionError::InvalidKey)
}
