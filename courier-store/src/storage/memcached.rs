//! Memcached backend: JSON records with native expiration.
//!
//! The server's exptime is the only liveness check on read.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use memcache::{Client, MemcacheError};
use tokio::sync::OnceCell;

use super::{decode_cached, Repository};
use crate::error::RepositoryError;
use crate::types::{Secret, SecretKey, StoredRecord};

const BACKEND: &str = "memcached";

/// Memcached reads exptime values above this as absolute unix time.
pub const MAX_RELATIVE_EXPIRATION: u32 = 60 * 60 * 24 * 30;

/// Expiration field for a record stored at `now`.
pub fn exptime(expiration: u32, now: i64) -> u32 {
    if expiration <= MAX_RELATIVE_EXPIRATION {
        return expiration;
    }
    let absolute = now.saturating_add(i64::from(expiration));
    u32::try_from(absolute).unwrap_or(u32::MAX)
}

/// `host:port` becomes `memcache://host:port`; URLs pass through.
pub fn server_url(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_owned()
    } else {
        format!("memcache://{addr}")
    }
}

/// Memcached-backed repository.
///
/// The `memcache` client is blocking, so every call runs on the blocking
/// pool. The client connects on first use.
pub struct MemcachedRepository {
    url: String,
    client: OnceCell<Arc<Client>>,
}

impl MemcachedRepository {
    pub fn new(addr: &str) -> Self {
        Self {
            url: server_url(addr),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<Arc<Client>, RepositoryError> {
        self.client
            .get_or_try_init(|| {
                let url = self.url.clone();
                async move {
                    tokio::task::spawn_blocking(move || Client::connect(url.as_str()))
                        .await
                        .map_err(|e| RepositoryError::backend(BACKEND, e))?
                        .map(Arc::new)
                        .map_err(|e| RepositoryError::backend(BACKEND, e))
                }
            })
            .await
            .cloned()
    }

    async fn run<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Client) -> Result<T, MemcacheError> + Send + 'static,
    {
        let client = self.client().await?;
        tokio::task::spawn_blocking(move || op(client.as_ref()))
            .await
            .map_err(|e| RepositoryError::backend(BACKEND, e))?
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }

    async fn fetch(&self, key: &SecretKey) -> Result<StoredRecord, RepositoryError> {
        let id = key.as_str().to_owned();
        let data: Option<String> = self.run(move |c| c.get(&id)).await?;
        decode_cached(data)
    }

    async fn remove(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        let id = key.as_str().to_owned();
        self.run(move |c| c.delete(&id)).await
    }
}

#[async_trait]
impl Repository for MemcachedRepository {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError> {
        // exptime 0 means "never" to memcached; a zero TTL means already gone.
        if secret.expiration == 0 {
            self.remove(key).await?;
            return Ok(());
        }
        let now = Utc::now().timestamp();
        let record = StoredRecord::at(key, secret, now);
        let json = record.to_json()?;
        let exp = exptime(secret.expiration, now);
        let id = record.id;
        self.run(move |c| c.set(&id, json.as_str(), exp)).await
    }

    async fn get(&self, key: &SecretKey) -> Result<Secret, RepositoryError> {
        let record = self.fetch(key).await?;
        if record.one_time && !self.remove(key).await? {
            tracing::debug!(backend = BACKEND, "one-time secret already consumed");
            return Err(RepositoryError::NotFound);
        }
        Ok(record.into_secret(Utc::now().timestamp()))
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        self.remove(key).await
    }

    async fn status(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        Ok(self.fetch(key).await?.one_time)
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn short_ttl_is_relative() {
        assert_eq!(exptime(3600, 1_700_000_000), 3600);
        assert_eq!(exptime(604800, 1_700_000_000), 604800);
        assert_eq!(exptime(MAX_RELATIVE_EXPIRATION, 1_700_000_000), MAX_RELATIVE_EXPIRATION);
    }

    #[test]
    fn long_ttl_is_absolute() {
        let ninety_days = 90 * 86400;
        assert_eq!(exptime(ninety_days, 1_700_000_000), 1_700_000_000 + ninety_days);
    }

    #[test]
    fn absolute_ttl_saturates() {
        assert_eq!(exptime(u32::MAX, i64::from(u32::MAX)), u32::MAX);
    }

    #[test]
    fn addr_gets_scheme() {
        assert_eq!(server_url("localhost:11211"), "memcache://localhost:11211");
        assert_eq!(
            server_url("memcache://cache:11211?timeout=2"),
            "memcache://cache:11211?timeout=2"
        );
    }

    #[test]
    fn backend_name() {
        assert_eq!(MemcachedRepository::new("localhost:11211").backend(), "memcached");
    }

    /// Runs only when `MEMCACHED` names a live server.
    #[tokio::test(flavor = "multi_thread")]
    async fn live_contract() {
        let Ok(addr) = std::env::var("MEMCACHED") else {
            return;
        };
        contract::exercise(&MemcachedRepository::new(&addr)).await;
    }
}
