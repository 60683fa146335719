//! Creation policy: which secrets the service accepts.

use serde::{Deserialize, Serialize};

use crate::error::PolicyViolation;
use crate::types::Secret;

/// 5 MiB of armored text.
pub const DEFAULT_MAX_LENGTH: usize = 5_242_880;

/// One hour, one day, one week.
pub const DEFAULT_EXPIRATIONS: [u32; 3] = [3600, 86400, 604800];

/// Rules applied by [`SecretService::create_secret`](crate::SecretService::create_secret)
/// before anything reaches storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPolicy {
    /// Maximum length of the armored message, in bytes.
    pub max_length: usize,
    /// Refuse secrets that survive their first read.
    pub force_one_time: bool,
    /// Accepted values for [`Secret::expiration`].
    pub allowed_expirations: Vec<u32>,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            force_one_time: false,
            allowed_expirations: DEFAULT_EXPIRATIONS.to_vec(),
        }
    }
}

impl SecretPolicy {
    pub fn with_force_one_time(mut self, force: bool) -> Self {
        self.force_one_time = force;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_allowed_expirations(mut self, expirations: impl Into<Vec<u32>>) -> Self {
        self.allowed_expirations = expirations.into();
        self
    }

    pub fn allows_expiration(&self, expiration: u32) -> bool {
        self.allowed_expirations.contains(&expiration)
    }

    /// Validate a secret. The first failing rule wins:
    /// envelope shape, expiration, one-time, length.
    ///
    /// The shape check only looks at the armor lines. The server never
    /// holds a passphrase, so it cannot and does not try to decrypt.
    pub fn check(&self, secret: &Secret) -> Result<(), PolicyViolation> {
        if !courier_envelope::is_armored(&secret.message) {
            return Err(PolicyViolation::NotEncrypted);
        }
        if !self.allows_expiration(secret.expiration) {
            return Err(PolicyViolation::InvalidExpiration(secret.expiration));
        }
        if self.force_one_time && !secret.one_time {
            return Err(PolicyViolation::OneTimeRequired);
        }
        let length = secret.message.len();
        if length > self.max_length {
            return Err(PolicyViolation::TooLong {
                length,
                max: self.max_length,
            });
        }
        Ok(())
    }
}
