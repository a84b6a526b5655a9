//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account and token operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bodegon_core::EmailError),

    /// Wrong password, unknown email, or inactive account at login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token missing, malformed or unknown.
    #[error("invalid token")]
    InvalidToken,

    /// Token belongs to a deactivated account.
    #[error("user inactive or deleted")]
    InactiveUser,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
