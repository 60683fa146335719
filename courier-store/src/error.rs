//! Error types for the secret store.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Repository errors
// ---------------------------------------------------------------------------

/// Failure reported by a repository backend.
///
/// Backends translate their own "missing" signal into [`RepositoryError::NotFound`]
/// so callers never match on driver errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("secret not found")]
    NotFound,

    #[error("{backend} error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("malformed record: {0}")]
    Corrupt(String),

    #[error("unsupported database: {0}")]
    Unsupported(String),
}

impl RepositoryError {
    pub fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            backend,
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Policy violations
// ---------------------------------------------------------------------------

/// A secret refused before any storage I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("message must be PGP encrypted")]
    NotEncrypted,

    #[error("invalid expiration specified")]
    InvalidExpiration(u32),

    #[error("secret must be one time download")]
    OneTimeRequired,

    #[error("the encrypted message is too long")]
    TooLong { length: usize, max: usize },
}

// ---------------------------------------------------------------------------
// Operation errors
// ---------------------------------------------------------------------------

/// Failure of [`SecretService::create_secret`](crate::SecretService::create_secret).
#[derive(Debug, Error)]
pub enum CreateError {
    #[error(transparent)]
    Rejected(#[from] PolicyViolation),

    #[error("failed to store secret in database")]
    Storage(#[source] RepositoryError),
}

impl CreateError {
    /// Caller input was at fault, as opposed to the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported database: {0}")]
    UnknownDatabase(String),

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{0} must be set for the selected database")]
    Missing(&'static str),

    #[error("allowed expirations must not be empty")]
    NoExpirations,
}
