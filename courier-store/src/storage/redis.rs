//! Redis backend: JSON records with `SET key value EX ttl`.
//!
//! Redis alone decides when a record expires; reads never compare
//! `expires_at` with the local clock.

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;

use super::{decode_cached, Repository};
use crate::error::RepositoryError;
use crate::types::{Secret, SecretKey, StoredRecord};

const BACKEND: &str = "redis";

/// Redis-backed repository.
///
/// The connection manager is created on first use and reconnects on its
/// own after that.
pub struct RedisRepository {
    client: Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisRepository {
    /// Parse `url` (`redis://host:port/db`). Does not connect.
    pub fn new(url: &str) -> Result<Self, RepositoryError> {
        let client = Client::open(url).map_err(|e| RepositoryError::backend(BACKEND, e))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    async fn conn(&self) -> Result<ConnectionManager, RepositoryError> {
        self.conn
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await
            .cloned()
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }

    async fn fetch(&self, key: &SecretKey) -> Result<StoredRecord, RepositoryError> {
        let mut conn = self.conn().await?;
        let data: Option<String> = conn
            .get(key.as_str())
            .await
            .map_err(|e| RepositoryError::backend(BACKEND, e))?;
        decode_cached(data)
    }

    async fn remove(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn
            .del(key.as_str())
            .await
            .map_err(|e| RepositoryError::backend(BACKEND, e))?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl Repository for RedisRepository {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError> {
        // EX 0 is rejected by the server; a zero TTL means already gone.
        if secret.expiration == 0 {
            self.remove(key).await?;
            return Ok(());
        }
        let json = StoredRecord::new(key, secret).to_json()?;
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(key.as_str(), json, u64::from(secret.expiration))
            .await
            .map_err(|e| RepositoryError::backend(BACKEND, e))
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
