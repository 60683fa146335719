//! In-process backend for tests and single-node deployments.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::Repository;
use crate::error::RepositoryError;
use crate::types::{Secret, SecretKey, StoredRecord};

const BACKEND: &str = "memory";

/// Records in a `HashMap` behind an `RwLock`.
///
/// Expiry is checked on every access. Every `put` sweeps expired entries
/// while it holds the write lock, so records nobody reads again do not
/// accumulate. A one-time `get` removes the record under the write lock,
/// so exactly one reader wins.
pub struct InMemoryRepository {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredRecord>>, RepositoryError> {
        self.records
            .read()
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredRecord>>, RepositoryError> {
        self.records
            .write()
            .map_err(|e| RepositoryError::backend(BACKEND, e))
    }

    /// Number of live records.
    pub fn len(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now().timestamp();
        Ok(self
            .read()?
            .values()
            .filter(|rec| !rec.is_expired_at(now))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now().timestamp();
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|_, rec| !rec.is_expired_at(now));
        Ok(before - records.len())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError> {
        let now = Utc::now().timestamp();
        let record = StoredRecord::at(key, secret, now);

        let mut records = self.write()?;
        let before = records.len();
        records.retain(|_, rec| !rec.is_expired_at(now));
        let swept = before - records.len();
        if swept > 0 {
            tracing::trace!(backend = BACKEND, swept, "dropped expired records");
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, key: &SecretKey) -> Result<Secret, RepositoryError> {
        let now = Utc::now().timestamp();

        // Multi-read records only need the shared lock.
        {
            let records = self.read()?;
            match records.get(key.as_str()) {
                None => return Err(RepositoryError::NotFound),
                Some(rec) if rec.is_expired_at(now) => return Err(RepositoryError::NotFound),
                Some(rec) if !rec.one_time => return Ok(rec.clone().into_secret(now)),
                Some(_) => {}
            }
        }

        let mut records = self.write()?;
        match records.remove(key.as_str()) {
            Some(rec) if !rec.is_expired_at(now) => Ok(rec.into_secret(now)),
            Some(_) => Err(RepositoryError::NotFound),
            None => {
                tracing::debug!(backend = BACKEND, "one-time secret already consumed");
                Err(RepositoryError::NotFound)
            }
        }
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        let now = Utc::now().timestamp();
        Ok(self
            .write()?
            .remove(key.as_str())
            .is_some_and(|rec| !rec.is_expired_at(now)))
    }

    async fn status(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        let now = Utc::now().timestamp();
        match self.read()?.get(key.as_str()) {
            Some(rec) if !rec.is_expired_at(now) => Ok(rec.one_time),
            _ => Err(RepositoryError::NotFound),
        }
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}
