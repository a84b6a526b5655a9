//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BODEGON_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed with `BODEGON_STORAGE=memory`)
//! - `BODEGON_PUBLIC_URL` - Public base URL (production only)
//!
//! ## Optional
//! - `BODEGON_STORAGE` - `postgres` (default) or `memory`
//! - `BODEGON_HOST` - Bind address (default: 127.0.0.1)
//! - `BODEGON_PORT` - Listen port (default: 8000)
//! - `BODEGON_ENV` - `development` (default) or `production`
//! - `BODEGON_MEDIA_ROOT` - Upload directory (default: media)
//! - `BODEGON_LOG_FORMAT` - `text` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which [`Store`](crate::db::Store) adapter backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected 'development' or 'production', got '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// API application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Storage adapter
    pub storage: StorageBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Directory uploaded images are written to
    pub media_root: PathBuf,
    /// Public base URL, required in production
    pub public_url: Option<Url>,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("storage", &self.storage)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("media_root", &self.media_root)
            .field("public_url", &self.public_url.as_ref().map(Url::as_str))
            .field("log_format", &self.log_format)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource(lookup);

        let storage: StorageBackend = env.parse_or("BODEGON_STORAGE", "postgres")?;
        let database_url = env.database_url("BODEGON_DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("BODEGON_DATABASE_URL".to_string()));
        }

        let host: IpAddr = env.parse_or("BODEGON_HOST", "127.0.0.1")?;
        let port: u16 = env.parse_or("BODEGON_PORT", "8000")?;
        let environment: Environment = env.parse_or("BODEGON_ENV", "development")?;
        let media_root = PathBuf::from(env.get_or_default("BODEGON_MEDIA_ROOT", "media"));

        let public_url = match env.get_optional("BODEGON_PUBLIC_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("BODEGON_PUBLIC_URL".to_string(), e.to_string())
            })?),
            None if environment == Environment::Production => {
                return Err(ConfigError::MissingEnvVar("BODEGON_PUBLIC_URL".to_string()));
            }
            None => None,
        };

        let log_format = match env.get_optional("BODEGON_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let sentry_sample_rate = env
            .get_optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .get_optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            database_url,
            storage,
            host,
            port,
            environment,
            media_root,
            public_url,
            log_format,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
            sentry_environment: env.get_optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// In-memory development configuration with every default applied.
    #[must_use]
    pub fn in_memory(media_root: impl Into<PathBuf>) -> Self {
        Self {
            database_url: None,
            storage: StorageBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            environment: Environment::Development,
            media_root: media_root.into(),
            public_url: None,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// URL builder for stored media paths.
    #[must_use]
    pub fn media_urls(&self) -> MediaUrls {
        let base = match (&self.public_url, self.environment) {
            (Some(url), Environment::Production) => url.as_str().trim_end_matches('/').to_owned(),
            _ => format!("http://{}:{}", self.host, self.port),
        };
        MediaUrls { base }
    }
}

/// Turns stored media paths into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrls {
    base: String,
}

impl MediaUrls {
    /// Absolute URL for a path relative to the media root.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/media/{}", self.base, path.trim_start_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with the usual required/optional/default accessors.
struct EnvSource<F>(F);

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; empty values count as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to a default.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Option<SecretString> {
        self.get_optional(primary_key)
            .or_else(|| self.get_optional("DATABASE_URL"))
            .map(SecretString::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BODEGON_DATABASE_URL", "postgres://localhost/bodegon")]).unwrap();
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.log_format, LogFormat::Text);
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fallback/db"
        );
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BODEGON_DATABASE_URL"));
    }

    #[test]
    fn test_memory_storage_needs_no_database() {
        let config = load(&[("BODEGON_STORAGE", "memory")]).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("BODEGON_STORAGE", "memory"), ("BODEGON_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "BODEGON_PORT"));

        let err = load(&[("BODEGON_STORAGE", "sqlite")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "BODEGON_STORAGE"));
    }

    #[test]
    fn test_production_requires_public_url() {
        let err = load(&[("BODEGON_STORAGE", "memory"), ("BODEGON_ENV", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BODEGON_PUBLIC_URL"));
    }

    #[test]
    fn test_media_urls_development() {
        let config = load(&[
            ("BODEGON_STORAGE", "memory"),
            ("BODEGON_HOST", "0.0.0.0"),
            ("BODEGON_PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(
            config.media_urls().url("uploads/product/a.png"),
            "http://0.0.0.0:9000/media/uploads/product/a.png"
        );
    }

    #[test]
    fn test_media_urls_production() {
        let config = load(&[
            ("BODEGON_STORAGE", "memory"),
            ("BODEGON_ENV", "production"),
            ("BODEGON_PUBLIC_URL", "https://api.bodegonasusalud.com/"),
        ])
        .unwrap();
        assert_eq!(
            config.media_urls().url("uploads/product/a.png"),
            "https://api.bodegonasusalud.com/media/uploads/product/a.png"
        );
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let config = load(&[
            ("BODEGON_DATABASE_URL", "postgres://app:super_secret_pw@db/bodegon"),
            ("SENTRY_DSN", "https://secret_dsn_key@sentry.example/1"),
        ])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("127.0.0.1"));
        assert!(!debug_output.contains("super_secret_pw"));
        assert!(!debug_output.contains("secret_dsn_key"));
    }
}
