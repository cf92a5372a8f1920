//! Bridge configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRIDGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BRIDGE_HOST` - Bind address (default: 127.0.0.1)
//! - `BRIDGE_PORT` - Listen port (default: 3002)
//! - `BRIDGE_REQUEST_DEADLINE_SECS` - Overall deadline for one product creation (default: 120)
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-01)
//! - `SHOPIFY_LOCATION_ID` - Location GID for initial inventory quantities
//! - `SHOPIFY_REQUEST_TIMEOUT_SECS` - Per-call HTTP timeout (default: 30)
//! - `SYNC_SETTLE_DELAY_MS` - Pause before re-fetching variants (default: 2000)
//! - `SYNC_MEDIA_POLL_ATTEMPTS` - Media status polls per image (default: 10)
//! - `SYNC_MEDIA_POLL_INTERVAL_MS` - First poll interval (default: 1000)
//! - `SYNC_MEDIA_POLL_MAX_INTERVAL_MS` - Poll interval cap (default: 5000)
//! - `SYNC_ATTACH_ATTEMPTS` - Attempts per media attachment (default: 3)
//! - `SYNC_ATTACH_PAUSE_MS` - Pause between attachment calls (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::sync::{Backoff, SyncSettings};

const DEFAULT_API_VERSION: &str = "2025-01";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Bridge application configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upper bound on the whole create-product sequence
    pub request_deadline: Duration,
    /// Shopify Admin API configuration
    pub shopify: ShopifyApiConfig,
    /// Orchestrator timing and retry settings
    pub sync: SyncSettings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Admin API configuration.
///
/// Shop domain and access token are not configured here: they arrive with
/// each request.
#[derive(Debug, Clone)]
pub struct ShopifyApiConfig {
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
    /// Timeout for a single HTTP call to Shopify
    pub request_timeout: Duration,
}

impl BridgeConfig {
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

        let database_url = get_database_url("BRIDGE_DATABASE_URL")?;
        let host = get_env_or_default("BRIDGE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BRIDGE_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_PORT".to_string(), e.to_string()))?;
        let request_deadline =
            Duration::from_secs(parse_env("BRIDGE_REQUEST_DEADLINE_SECS", 120)?);

        let shopify = ShopifyApiConfig::from_env()?;
        let sync = sync_settings_from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            request_deadline,
            shopify,
            sync,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            request_timeout: Duration::from_secs(parse_env("SHOPIFY_REQUEST_TIMEOUT_SECS", 30)?),
        })
    }
}

fn sync_settings_from_env() -> Result<SyncSettings, ConfigError> {
    let attach_attempts: u32 = parse_env("SYNC_ATTACH_ATTEMPTS", 3)?;
    let poll_attempts: u32 = parse_env("SYNC_MEDIA_POLL_ATTEMPTS", 10)?;

    if attach_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "SYNC_ATTACH_ATTEMPTS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    if poll_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "SYNC_MEDIA_POLL_ATTEMPTS".to_string(),
            "must be at least 1".to_string(),
        ));
    }

    Ok(SyncSettings {
        settle_delay: Duration::from_millis(parse_env("SYNC_SETTLE_DELAY_MS", 2000)?),
        media_poll: Backoff {
            max_attempts: poll_attempts,
            initial_interval: Duration::from_millis(parse_env("SYNC_MEDIA_POLL_INTERVAL_MS", 1000)?),
            max_interval: Duration::from_millis(parse_env(
                "SYNC_MEDIA_POLL_MAX_INTERVAL_MS",
                5000,
            )?),
            multiplier: 2,
        },
        attach_attempts,
        attach_pause: Duration::from_millis(parse_env("SYNC_ATTACH_PAUSE_MS", 500)?),
        location_id: get_optional_env("SHOPIFY_LOCATION_ID").filter(|s| !s.trim().is_empty()),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional numeric environment variable.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
