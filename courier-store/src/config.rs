//! Environment configuration.
//!
//! Variables:
//!   COURIER_DATABASE               - memory | memcached | redis | dynamodb (default: memcached)
//!   COURIER_MEMCACHED              - Memcached address (default: localhost:11211)
//!   COURIER_REDIS                  - Redis URL (default: redis://localhost:6379/0)
//!   COURIER_DYNAMODB_TABLE         - DynamoDB table, required for dynamodb
//!   COURIER_MAX_LENGTH             - Max armored message bytes (default: 5242880)
//!   COURIER_FORCE_ONETIME_SECRETS  - Refuse multi-read secrets (default: false)
//!   COURIER_ALLOWED_EXPIRATIONS    - Comma-separated seconds (default: 3600,86400,604800)

use crate::error::ConfigError;
use crate::policy::{SecretPolicy, DEFAULT_EXPIRATIONS, DEFAULT_MAX_LENGTH};
use crate::storage::{StorageConfig, DEFAULT_MEMCACHED, DEFAULT_REDIS};

pub const ENV_DATABASE: &str = "COURIER_DATABASE";
pub const ENV_MEMCACHED: &str = "COURIER_MEMCACHED";
pub const ENV_REDIS: &str = "COURIER_REDIS";
pub const ENV_DYNAMODB_TABLE: &str = "COURIER_DYNAMODB_TABLE";
pub const ENV_MAX_LENGTH: &str = "COURIER_MAX_LENGTH";
pub const ENV_FORCE_ONETIME: &str = "COURIER_FORCE_ONETIME_SECRETS";
pub const ENV_ALLOWED_EXPIRATIONS: &str = "COURIER_ALLOWED_EXPIRATIONS";

/// Process configuration: backend selection plus creation policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    storage: StorageConfig,
    policy: SecretPolicy,
}

impl Config {
    pub fn new(storage: StorageConfig, policy: SecretPolicy) -> Self {
        Self { storage, policy }
    }

    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through `lookup`. Unset and empty variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let storage = match get(ENV_DATABASE).as_deref().unwrap_or("memcached") {
            "memory" => StorageConfig::Memory,
            "memcached" => StorageConfig::Memcached {
                addr: get(ENV_MEMCACHED).unwrap_or_else(|| DEFAULT_MEMCACHED.to_owned()),
            },
            "redis" => StorageConfig::Redis {
                url: get(ENV_REDIS).unwrap_or_else(|| DEFAULT_REDIS.to_owned()),
            },
            "dynamodb" => StorageConfig::DynamoDb {
                table: get(ENV_DYNAMODB_TABLE).ok_or(ConfigError::Missing(ENV_DYNAMODB_TABLE))?,
            },
            other => return Err(ConfigError::UnknownDatabase(other.to_owned())),
        };

        let max_length = match get(ENV_MAX_LENGTH) {
            Some(v) => v.parse().map_err(|_| invalid(ENV_MAX_LENGTH, &v))?,
            None => DEFAULT_MAX_LENGTH,
        };

        let force_one_time = match get(ENV_FORCE_ONETIME) {
            Some(v) => parse_bool(&v).ok_or_else(|| invalid(ENV_FORCE_ONETIME, &v))?,
            None => false,
        };

        let allowed_expirations = match get(ENV_ALLOWED_EXPIRATIONS) {
            Some(v) => parse_expirations(&v).ok_or_else(|| invalid(ENV_ALLOWED_EXPIRATIONS, &v))?,
            None => DEFAULT_EXPIRATIONS.to_vec(),
        };
        if allowed_expirations.is_empty() {
            return Err(ConfigError::NoExpirations);
        }

        Ok(Self {
            storage,
            policy: SecretPolicy {
                max_length,
                force_one_time,
                allowed_expirations,
            },
        })
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn policy(&self) -> &SecretPolicy {
        &self.policy
    }

    pub fn into_parts(self) -> (StorageConfig, SecretPolicy) {
        (self.storage, self.policy)
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_owned(),
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Comma-separated seconds, blanks skipped, duplicates dropped.
fn parse_expirations(v: &str) -> Option<Vec<u32>> {
    let mut out = Vec::new();
    for part in v.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let secs: u32 = part.parse().ok()?;
        if !out.contains(&secs) {
            out.push(secs);
        }
    }
    Some(out)
}
