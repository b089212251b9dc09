//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marketplace_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Display name missing.
    #[error("display name is required")]
    MissingDisplayName,

    /// The auth provider throttled this client.
    #[error("too many attempts, try again later")]
    RateLimited,

    /// Auth provider call failed.
    #[error("auth provider error: {0}")]
    Provider(BackendError),

    /// Profile read or write failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<BackendError> for AuthError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::AlreadyExists(_) => Self::UserAlreadyExists,
            BackendError::InvalidCredentials => Self::InvalidCredentials,
            BackendError::InvalidArgument(message) => Self::WeakPassword(message),
            BackendError::RateLimited => Self::RateLimited,
            other => Self::Provider(other),
        }
    }
}
