//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`. Bodies are JSON: `{"error": "...", "field": "..."}`
//! with `field` present only for validation failures.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;
use crate::services::auth::AuthError;
use crate::services::media::MediaError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Catalog or order service failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Account or token operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Image upload failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Service(ServiceError::Storage(_))
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Media(MediaError::Io(_))
        )
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Service(ServiceError::NotFound { .. }) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Auth(AuthError::InvalidToken | AuthError::InactiveUser)
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message and offending field. Never exposes internals.
    fn body(&self) -> ErrorBody {
        let (error, field) = if self.is_server_error() {
            (INTERNAL_MESSAGE.to_string(), None)
        } else {
            match self {
                Self::Service(ServiceError::Validation { field, message }) => {
                    (message.clone(), Some(field.clone()))
                }
                Self::Service(err @ ServiceError::NotFound { .. }) => (err.to_string(), None),
                Self::Service(ServiceError::Conflict(msg)) => (msg.clone(), None),
                Self::Auth(err) => auth_message(err),
                Self::Media(err) => (err.to_string(), Some("image".to_string())),
                Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => {
                    (msg.clone(), None)
                }
                _ => (INTERNAL_MESSAGE.to_string(), None),
            }
        };
        ErrorBody { error, field }
    }
}

fn auth_message(err: &AuthError) -> (String, Option<String>) {
    match err {
        AuthError::InvalidEmail(e) => (e.to_string(), Some("email".to_string())),
        AuthError::WeakPassword(msg) => (msg.clone(), Some("password".to_string())),
        AuthError::UserAlreadyExists => (
            "user with this email already exists".to_string(),
            Some("email".to_string()),
        ),
        AuthError::InvalidCredentials => (
            "Unable to authenticate with provided credentials".to_string(),
            None,
        ),
        AuthError::InvalidToken => ("Invalid token".to_string(), None),
        AuthError::InactiveUser => ("User inactive or deleted".to_string(), None),
        AuthError::Repository(_) | AuthError::PasswordHash => {
            (INTERNAL_MESSAGE.to_string(), None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let mut response = (status, Json(self.body())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
