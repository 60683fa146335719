//! Repository backends: where secrets live until read or expired.
//!
//! Every backend honors the same contract:
//!
//! - `put` overwrites and sets the backend's native expiry
//! - `get` of a one-time record deletes it; only the caller whose delete
//!   removed the record receives it, concurrent readers see `NotFound`
//! - `delete` is idempotent and reports whether something was removed
//! - `status` never consumes and never returns the message

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::types::{Secret, SecretKey, StoredRecord};

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
#[cfg(feature = "memcached")]
pub mod memcached;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::InMemoryRepository;

// ---------------------------------------------------------------------------
// Repository trait
// ---------------------------------------------------------------------------

/// Key-value store for secrets.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError>;

    /// Fetch a secret, consuming it when it is one-time.
    async fn get(&self, key: &SecretKey) -> Result<Secret, RepositoryError>;

    async fn delete(&self, key: &SecretKey) -> Result<bool, RepositoryError>;

    /// The stored one-time flag.
    async fn status(&self, key: &SecretKey) -> Result<bool, RepositoryError>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError> {
        (**self).put(key, secret).await
    }

    async fn get(&self, key: &SecretKey) -> Result<Secret, RepositoryError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        (**self).delete(key).await
    }

    async fn status(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        (**self).status(key).await
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

pub const DEFAULT_MEMCACHED: &str = "localhost:11211";
pub const DEFAULT_REDIS: &str = "redis://localhost:6379/0";

/// Which backend to build, and where it lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Memcached { addr: String },
    Redis { url: String },
    DynamoDb { table: String },
}

impl StorageConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Memcached { .. } => "memcached",
            Self::Redis { .. } => "redis",
            Self::DynamoDb { .. } => "dynamodb",
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memcached {
            addr: DEFAULT_MEMCACHED.to_owned(),
        }
    }
}

/// Build the configured backend. Called once at startup.
///
/// Network backends connect lazily, so this succeeds even when the
/// server is not reachable yet.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn Repository>, RepositoryError> {
    let repo: Arc<dyn Repository> = match config {
        StorageConfig::Memory => Arc::new(InMemoryRepository::new()),

        #[cfg(feature = "memcached")]
        StorageConfig::Memcached { addr } => Arc::new(memcached::MemcachedRepository::new(addr)),

        #[cfg(feature = "redis")]
        StorageConfig::Redis { url } => Arc::new(self::redis::RedisRepository::new(url)?),

        #[cfg(feature = "dynamodb")]
        StorageConfig::DynamoDb { table } => {
            Arc::new(dynamodb::DynamoDbRepository::from_env(table.clone()).await)
        }

        #[allow(unreachable_patterns)]
        other => return Err(RepositoryError::Unsupported(other.name().to_owned())),
    };

    tracing::info!(backend = repo.backend(), "repository ready");
    Ok(repo)
}

/// Decode a record read from a cache with native expiry.
///
/// The cache's own TTL decides whether a record is still alive. The
/// stored `expires_at` is only used to report the remaining lifetime, so
/// clock drift between application hosts cannot hide a live record.
#[cfg(any(feature = "redis", feature = "memcached"))]
pub(crate) fn decode_cached(data: Option<String>) -> Result<StoredRecord, RepositoryError> {
    StoredRecord::from_json(&data.ok_or(RepositoryError::NotFound)?)
}

// ---------------------------------------------------------------------------
// Shared contract checks, run against every backend
// ---------------------------------------------------------------------------
