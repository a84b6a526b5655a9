//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bodegon-cli user create-superuser -e admin@bodegonasusalud.com -p 's3cret!' -n "Admin"
//! ```
//!
//! # Environment Variables
//!
//! - `BODEGON_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

use bodegon_api::db::PgStore;
use bodegon_api::services::auth::{AuthError, AuthService};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account could not be created.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a staff user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserCommandError` if the database is unreachable, the input is
/// invalid, or the email is already registered.
pub async fn create_superuser(
    email: &str,
    password: &str,
    name: &str,
) -> Result<i32, UserCommandError> {
    let database_url =
        super::database_url().ok_or(UserCommandError::MissingEnvVar("BODEGON_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = bodegon_api::db::create_pool(&database_url).await?;
    let store = PgStore::new(pool);

    let user = AuthService::new(&store)
        .create_superuser(email, password, name)
        .await?;

    tracing::info!("Created superuser {} (id {})", user.email, user.id);
    Ok(user.id.as_i32())
}
