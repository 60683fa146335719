//! Wire format (v1 passphrase envelope)
//!
//! Format (v1):
//!   version[1] || suite_kdf[1] || suite_aead[1] || flags[1]
//!   || m_cost_kib[4] || t_cost[1] || p_cost[1]
//!   || salt[16] || nonce[12] || name_len[1] || name[name_len] || aead_ct[16+]
//!
//! Everything before aead_ct is the header and doubles as the AEAD AAD.

use crate::error::{DecryptionError, EncodingError};

/// Protocol identifier for KDF domain separation (v1)
pub const PROTOCOL_ID: &[u8] = b"courier-env-v1";

/// Version byte for v1
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Suite identifiers (on-wire)
pub const SUITE_KDF_ARGON2ID: u8 = 0xC1;
pub const SUITE_AEAD_AES256GCM: u8 = 0xB1;

/// Plaintext came from a named file rather than free text.
pub const FLAG_BINARY: u8 = 0x01;
const KNOWN_FLAGS: u8 = FLAG_BINARY;

pub const SALT_BYTES: usize = 16;
pub const NONCE_BYTES: usize = 12;
pub const AEAD_TAG_BYTES: usize = 16;
pub const AES_KEY_BYTES: usize = 32;
pub const MAX_FILENAME_BYTES: usize = u8::MAX as usize;

/// version + suite_kdf + suite_aead + flags + m_cost(u32) + t_cost + p_cost
pub const FIXED_HEADER_BYTES: usize = 1 + 1 + 1 + 1 + 4 + 1 + 1; // 10

/// Header without a filename: fixed part + salt + nonce + name_len
pub const MIN_HEADER_BYTES: usize = FIXED_HEADER_BYTES + SALT_BYTES + NONCE_BYTES + 1; // 39

/// Smallest valid message: empty filename, empty plaintext.
pub const MIN_MESSAGE_BYTES: usize = MIN_HEADER_BYTES + AEAD_TAG_BYTES; // 55

/// KDF cost bounds accepted on decode. Keeps a forged header from
/// demanding unbounded memory or time.
pub const MIN_M_COST_KIB: u32 = 8;
pub const MAX_M_COST_KIB: u32 = 256 * 1024;
pub const MAX_T_COST: u8 = 16;
pub const MAX_P_COST: u8 = 8;
/// Argon2 needs at least this much memory for each lane.
pub const MIN_M_COST_KIB_PER_LANE: u32 = 8;

/// Borrowed view of a parsed message.
#[derive(Debug, Clone, Copy)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub suite_kdf: u8,
    pub suite_aead: u8,
    pub flags: u8,
    pub m_cost_kib: u32,
    pub t_cost: u8,
    pub p_cost: u8,
    pub salt: &'a [u8; SALT_BYTES],
    pub nonce: &'a [u8; NONCE_BYTES],
    pub filename: &'a str,
    /// Header bytes, bound as AEAD associated data.
    pub header: &'a [u8],
    pub aead_ciphertext: &'a [u8],
}

impl WireComponents<'_> {
    pub fn is_binary(&self) -> bool {
        self.flags & FLAG_BINARY != 0
    }
}

/// Header fields chosen by the sender.
#[derive(Debug, Clone, Copy)]
pub struct WireHeader<'a> {
    pub flags: u8,
    pub m_cost_kib: u32,
    pub t_cost: u8,
    pub p_cost: u8,
    pub salt: &'a [u8; SALT_BYTES],
    pub nonce: &'a [u8; NONCE_BYTES],
    pub filename: &'a str,
}

pub fn decode_wire(data: &[u8]) -> Result<WireComponents<'_>, DecryptionError> {
    if data.len() < MIN_MESSAGE_BYTES {
        return Err(DecryptionError::InvalidMessage);
    }

    let version = data[0];
    let suite_kdf = data[1];
    let suite_aead = data[2];
    let flags = data[3];
    let m_cost_kib = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    let t_cost = data[8];
    let p_cost = data[9];

    if version != PROTOCOL_VERSION {
        return Err(DecryptionError::InvalidMessage);
    }
    if suite_kdf != SUITE_KDF_ARGON2ID || suite_aead != SUITE_AEAD_AES256GCM {
        return Err(DecryptionError::InvalidMessage);
    }
    if flags & !KNOWN_FLAGS != 0 {
        return Err(DecryptionError::InvalidMessage);
    }
    if !(MIN_M_COST_KIB..=MAX_M_COST_KIB).contains(&m_cost_kib)
        || !(1..=MAX_T_COST).contains(&t_cost)
        || !(1..=MAX_P_COST).contains(&p_cost)
        || m_cost_kib < MIN_M_COST_KIB_PER_LANE * u32::from(p_cost)
    {
        return Err(DecryptionError::InvalidMessage);
    }

    let salt_start = FIXED_HEADER_BYTES;
    let salt_end = salt_start + SALT_BYTES;
    let nonce_end = salt_end + NONCE_BYTES;
    let name_len = data[nonce_end] as usize;
    let name_start = nonce_end + 1;
    let header_end = name_start + name_len;

    if data.len() < header_end + AEAD_TAG_BYTES {
        return Err(DecryptionError::InvalidMessage);
    }

    let salt: &[u8; SALT_BYTES] = data[salt_start..salt_end]
        .try_into()
        .map_err(|_| DecryptionError::InvalidMessage)?;
    let nonce: &[u8; NONCE_BYTES] = data[salt_end..nonce_end]
        .try_into()
        .map_err(|_| DecryptionError::InvalidMessage)?;
    let filename = core::str::from_utf8(&data[name_start..header_end])
        .map_err(|_| DecryptionError::InvalidMessage)?;

    Ok(WireComponents {
        version,
        suite_kdf,
        suite_aead,
        flags,
        m_cost_kib,
        t_cost,
        p_cost,
        salt,
        nonce,
        filename,
        header: &data[..header_end],
        aead_ciphertext: &data[header_end..],
    })
}

/// Serialize the header. The result is also the AAD for sealing.
pub fn encode_header(header: &WireHeader<'_>) -> Result<Vec<u8>, EncodingError> {
    if header.filename.len() > MAX_FILENAME_BYTES {
        return Err(EncodingError::FilenameTooLong);
    }

    let mut out = Vec::with_capacity(MIN_HEADER_BYTES + header.filename.len());

    out.push(PROTOCOL_VERSION);
    out.push(SUITE_KDF_ARGON2ID);
    out.push(SUITE_AEAD_AES256GCM);
    out.push(header.flags);
    out.extend_from_slice(&header.m_cost_kib.to_be_bytes());
    out.push(header.t_cost);
    out.push(header.p_cost);
    out.extend_from_slice(header.salt);
    out.extend_from_slice(header.nonce);
    out.push(header.filename.len() as u8);
    out.extend_from_slice(header.filename.as_bytes());

    Ok(out)
}

/// Append the AEAD output to an encoded header.
pub fn encode_wire(mut header: Vec<u8>, aead_ct: &[u8]) -> Vec<u8> {
    header.extend_from_slice(aead_ct);
    header
}
