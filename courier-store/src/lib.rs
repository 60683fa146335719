//! # Courier Store
//!
//! Server side of one-time secret sharing.
//!
//! Clients encrypt with `courier-envelope` and hand the armored message
//! to [`SecretService`], which checks it against a [`SecretPolicy`] and
//! stores it in a [`Repository`] under a fresh [`SecretKey`]. The server
//! never sees a passphrase.
//!
//! ## Quick Start
//!
//! ```
//! use courier_store::*;
//! use std::sync::Arc;
//!
//! # tokio_test_block_on(async {
//! let repo = Arc::new(InMemoryRepository::new());
//! let service = SecretService::new(repo, SecretPolicy::default());
//!
//! let message = courier_envelope::encrypt(b"hunter2", "passphrase").unwrap();
//! let key = service
//!     .create_secret(&Secret::new(message, 3600, true))
//!     .await
//!     .unwrap();
//!
//! let secret = service.get_secret(&key).await.unwrap();
//! let plain = courier_envelope::decrypt(secret.message.as_bytes(), "passphrase").unwrap();
//! assert_eq!(plain.content, b"hunter2");
//!
//! // one-time: gone after the first read
//! assert!(service.get_secret(&key).await.unwrap_err().is_not_found());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod error;
pub mod policy;
pub mod service;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ConfigError, CreateError, PolicyViolation, RepositoryError};
pub use policy::SecretPolicy;
pub use service::SecretService;
pub use storage::{connect, InMemoryRepository, Repository, StorageConfig};
pub use types::{Secret, SecretKey, StoredRecord};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use courier_envelope::{Envelope, KdfParams};
    use std::sync::Arc;

    fn envelope() -> Envelope {
        Envelope::with_kdf(KdfParams::new(64, 1, 1))
    }

    async fn service_from(vars: &[(&str, &str)]) -> SecretService {
        let cfg = Config::from_lookup(|k| {
            vars.iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();
        let repo = connect(cfg.storage()).await.unwrap();
        SecretService::new(repo, cfg.policy().clone())
    }

    #[tokio::test]
    async fn config_to_service_lifecycle() {
        let svc = service_from(&[
            ("COURIER_DATABASE", "memory"),
            ("COURIER_ALLOWED_EXPIRATIONS", "60"),
        ])
        .await;

        let message = envelope().encrypt(b"db password", "k").unwrap();
        let key = svc.create_secret(&Secret::new(message, 60, false)).await.unwrap();

        assert!(!svc.get_secret_status(&key).await.unwrap());
        let stored = svc.get_secret(&key).await.unwrap();
        let plain = envelope().decrypt(stored.message.as_bytes(), "k").unwrap();
        assert_eq!(plain.content_str(), "db password");

        assert!(svc.delete_secret(&key).await.unwrap());
        assert!(!svc.delete_secret(&key).await.unwrap());
        assert!(svc.get_secret(&key).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn forced_one_time_from_config() {
        let svc = service_from(&[
            ("COURIER_DATABASE", "memory"),
            ("COURIER_FORCE_ONETIME_SECRETS", "true"),
        ])
        .await;
        let message = envelope().encrypt(b"x", "k").unwrap();

        let err = svc
            .create_secret(&Secret::new(message.clone(), 3600, false))
            .await
            .unwrap_err();
        assert!(matches!(err, CreateError::Rejected(PolicyViolation::OneTimeRequired)));

        let key = svc.create_secret(&Secret::new(message, 3600, true)).await.unwrap();
        assert!(svc.get_secret_status(&key).await.unwrap());
    }

    #[tokio::test]
    async fn file_envelope_survives_storage() {
        let svc = SecretService::new(Arc::new(InMemoryRepository::new()), SecretPolicy::default());
        let message = envelope().encrypt_file(&[0, 1, 2, 255], "k", "blob.bin").unwrap();
        let key = svc.create_secret(&Secret::new(message, 86400, true)).await.unwrap();

        let stored = svc.get_secret(&key).await.unwrap();
        let plain = envelope().decrypt(stored.message.as_bytes(), "k").unwrap();
        assert_eq!(plain.content, vec![0, 1, 2, 255]);
        assert_eq!(plain.filename.as_deref(), Some("blob.bin"));
    }
}
