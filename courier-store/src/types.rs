//! Core types: Secret, SecretKey, StoredRecord.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::RepositoryError;

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// An already-encrypted message plus its retention rules.
///
/// Immutable once stored: there is no update path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Armored ciphertext. Never decrypted server side.
    pub message: String,
    /// Seconds until the backend evicts the record.
    #[serde(default)]
    pub expiration: u32,
    /// Delete on first successful read.
    #[serde(default, rename = "one_time", alias = "oneTime")]
    pub one_time: bool,
}

impl Secret {
    pub fn new(message: impl Into<String>, expiration: u32, one_time: bool) -> Self {
        Self {
            message: message.into(),
            expiration,
            one_time,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Storage key and capability token (UUID v4, lowercase hyphenated).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretKey(String);

impl SecretKey {
    /// Create a new random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Validate a key taken from a request path.
    ///
    /// Accepts exactly `[0-9a-f]{8}-([0-9a-f]{4}-){3}[0-9a-f]{12}`.
    pub fn parse(s: &str) -> Option<Self> {
        const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

        let mut parts = s.split('-');
        for len in GROUPS {
            let part = parts.next()?;
            if part.len() != len || !part.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
                return None;
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self(s.to_owned()))
    }

    /// Wrap a string without validation (for testing/deterministic use).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

/// Backend-neutral record layout, JSON-encoded by the cache backends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub message: String,
    pub one_time: bool,
    /// Unix seconds after which the record is gone.
    pub expires_at: i64,
}

impl StoredRecord {
    pub fn new(key: &SecretKey, secret: &Secret) -> Self {
        Self::at(key, secret, Utc::now().timestamp())
    }

    pub fn at(key: &SecretKey, secret: &Secret, now: i64) -> Self {
        Self {
            id: key.as_str().to_owned(),
            message: secret.message.clone(),
            one_time: secret.one_time,
            expires_at: now + i64::from(secret.expiration),
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime in whole seconds, zero once expired.
    pub fn ttl_at(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at - now).unwrap_or(0)
    }

    pub fn into_secret(self, now: i64) -> Secret {
        Secret {
            expiration: u32::try_from(self.ttl_at(now)).unwrap_or(u32::MAX),
            message: self.message,
            one_time: self.one_time,
        }
    }

    pub fn to_json(&self) -> Result<String, RepositoryError> {
        serde_json::to_string(self).map_err(|e| RepositoryError::Corrupt(e.to_string()))
    }

    pub fn from_json(data: &str) -> Result<Self, RepositoryError> {
        serde_json::from_str(data).map_err(|e| RepositoryError::Corrupt(e.to_string()))
    }
}
