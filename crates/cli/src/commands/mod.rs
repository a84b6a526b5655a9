//! CLI command implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Get the API database URL with fallback to generic `DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("BODEGON_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
