//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Accounts, password login and API tokens
//! - `catalog` - Categories and owner-scoped products
//! - `orders` - Order placement and owner-scoped order queries
//! - `media` - Uploaded product images on disk
//!
//! Services borrow the [`Store`](crate::db::Store) for the duration of one
//! request and never hold state of their own.

pub mod auth;
pub mod catalog;
pub mod media;
pub mod orders;

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors returned by the catalog and order services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before anything was written.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Entity missing or owned by someone else.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Uniqueness constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
