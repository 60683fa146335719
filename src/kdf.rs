//! KDF (v1 passphrase)
//!
//! master = Argon2id(passphrase, salt, m_cost, t_cost, p_cost, len=32)
//! info   = PROTOCOL_ID || b"|aes|"
//! key    = HKDF-SHA256(master, salt=None, info=info, len=32)

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::wire::{AES_KEY_BYTES, PROTOCOL_ID};

/// Argon2id cost parameters. They travel inside every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u8,
    pub p_cost: u8,
}

impl KdfParams {
    pub const fn new(m_cost_kib: u32, t_cost: u8, p_cost: u8) -> Self {
        Self { m_cost_kib, t_cost, p_cost }
    }
}

impl Default for KdfParams {
    /// Argon2 defaults: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self::new(Params::DEFAULT_M_COST, Params::DEFAULT_T_COST as u8, Params::DEFAULT_P_COST as u8)
    }
}

/// Unit error: the caller decides which public error it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfError;

pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; AES_KEY_BYTES]>, KdfError> {
    let argon_params = Params::new(
        params.m_cost_kib,
        params.t_cost as u32,
        params.p_cost as u32,
        Some(AES_KEY_BYTES),
    )
    .map_err(|_| KdfError)?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut master = Zeroizing::new([0u8; AES_KEY_BYTES]);
    argon
        .hash_password_into(passphrase, salt, master.as_mut())
        .map_err(|_| KdfError)?;

    let mut info = Vec::with_capacity(PROTOCOL_ID.len() + 5);
    info.extend_from_slice(PROTOCOL_ID);
    info.extend_from_slice(b"|aes|");

    let hk = Hkdf::<Sha256>::new(None, master.as_ref());
    let mut out = Zeroizing::new([0u8; AES_KEY_BYTES]);
    hk.expand(&info, out.as_mut()).map_err(|_| KdfError)?;
    Ok(out)
}
