//! Secret service: validates new secrets and delegates to the repository.

use std::sync::Arc;

use crate::error::{CreateError, RepositoryError};
use crate::policy::SecretPolicy;
use crate::storage::Repository;
use crate::types::{Secret, SecretKey};

/// Entry point for the transport layer.
///
/// Holds no mutable state; clone freely and share across tasks.
#[derive(Clone)]
pub struct SecretService {
    repo: Arc<dyn Repository>,
    policy: Arc<SecretPolicy>,
}

impl SecretService {
    pub fn new(repo: Arc<dyn Repository>, policy: SecretPolicy) -> Self {
        Self {
            repo,
            policy: Arc::new(policy),
        }
    }

    /// Active policy, as published to clients.
    pub fn policy(&self) -> &SecretPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &'static str {
        self.repo.backend()
    }

    /// Validate and store a secret under a freshly generated key.
    ///
    /// A rejected secret never reaches the repository.
    pub async fn create_secret(&self, secret: &Secret) -> Result<SecretKey, CreateError> {
        if let Err(violation) = self.policy.check(secret) {
            tracing::debug!(reason = %violation, "secret rejected");
            return Err(violation.into());
        }

        let key = SecretKey::generate();
        if let Err(err) = self.repo.put(&key, secret).await {
            tracing::warn!(backend = self.repo.backend(), error = %err, "failed to store secret");
            return Err(CreateError::Storage(err));
        }

        tracing::debug!(
            backend = self.repo.backend(),
            expiration = secret.expiration,
            one_time = secret.one_time,
            length = secret.message.len(),
            "secret stored"
        );
        Ok(key)
    }

    pub async fn get_secret(&self, key: &SecretKey) -> Result<Secret, RepositoryError> {
        self.repo.get(key).await
    }

    /// One-time flag of a stored secret. Does not consume it.
    pub async fn get_secret_status(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        self.repo.status(key).await
    }

    pub async fn delete_secret(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        self.repo.delete(key).await
    }
}
