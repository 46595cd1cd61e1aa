//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Origin allowed to make credentialed CORS requests (the web client).
    pub cors_origin: String,
    /// Per-request timeout for every external catalog call, so one slow
    /// source cannot stall the whole fallback chain.
    pub catalog_timeout: Duration,
    /// Lifetime of a login session.
    pub session_ttl_days: i64,
    pub finna_base_url: String,
    pub google_books_base_url: String,
    pub open_library_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Catalog and Session Settings ---
        let catalog_timeout_str =
            std::env::var("CATALOG_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string());
        let catalog_timeout_secs = catalog_timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "CATALOG_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a valid number of seconds", catalog_timeout_str),
            )
        })?;
        let catalog_timeout = Duration::from_secs(catalog_timeout_secs.max(1));

        let session_ttl_str =
            std::env::var("SESSION_TTL_DAYS").unwrap_or_else(|_| "30".to_string());
        let session_ttl_days = session_ttl_str.parse::<i64>().map_err(|_| {
            ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!("'{}' is not a valid number of days", session_ttl_str),
            )
        })?;

        // --- Load Catalog Source Endpoints (overridable for testing) ---
        let finna_base_url = std::env::var("FINNA_BASE_URL")
            .unwrap_or_else(|_| "https://api.finna.fi".to_string());
        let google_books_base_url = std::env::var("GOOGLE_BOOKS_BASE_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com".to_string());
        let open_library_base_url = std::env::var("OPEN_LIBRARY_BASE_URL")
            .unwrap_or_else(|_| "https://openlibrary.org".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            catalog_timeout,
            session_ttl_days,
            finna_base_url,
            google_books_base_url,
            open_library_base_url,
        })
    }
}
