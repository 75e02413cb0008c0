//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BUNDLEWISE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BUNDLEWISE_BASE_URL` - Public URL of the app (OAuth redirects, webhook callbacks)
//! - `SHOPIFY_API_KEY` - App client ID (also the `aud` of session tokens)
//! - `SHOPIFY_API_SECRET` - App client secret (signs session tokens, webhooks, OAuth callbacks)
//!
//! ## Optional
//! - `BUNDLEWISE_HOST` - Bind address (default: 127.0.0.1)
//! - `BUNDLEWISE_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2025-01)
//! - `SHOPIFY_SCOPES` - Comma-separated OAuth scopes (default: see [`DEFAULT_SCOPES`])
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated storefront origins (default: any)
//! - `BULK_POLL_INTERVAL_SECS` - Bulk operation poll interval (default: 2)
//! - `BULK_POLL_TIMEOUT_SECS` - Bulk operation timeout (default: 120)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `BUNDLEWISE_TLS_CERT` - PEM-encoded certificate chain
//! - `BUNDLEWISE_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_API_VERSION: &str = "2025-01";

/// Scopes requested on install when `SHOPIFY_SCOPES` is unset.
pub const DEFAULT_SCOPES: &[&str] = &[
    "read_products",
    "read_inventory",
    "read_locations",
    "read_markets",
    "read_orders",
    "write_cart_transforms",
];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// Shopify app credentials and API settings
    pub shopify: ShopifyAppConfig,
    /// Allowed storefront origins for the public API (empty = any)
    pub cors_allowed_origins: Vec<String>,
    /// Bulk operation polling
    pub bulk: BulkPollConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// Admin API version (e.g., 2025-01)
    pub api_version: String,
    /// OAuth client ID
    pub api_key: String,
    /// OAuth client secret
    pub api_secret: SecretString,
    /// Scopes requested during install
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// How the bulk order export waits for Shopify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkPollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for BulkPollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

impl BulkPollConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let interval = parse_secs("BULK_POLL_INTERVAL_SECS", defaults.interval)?;
        let timeout = parse_secs("BULK_POLL_TIMEOUT_SECS", defaults.timeout)?;
        if interval.is_zero() || timeout < interval {
            return Err(ConfigError::InvalidEnvVar(
                "BULK_POLL_*".to_string(),
                "interval must be positive and no longer than the timeout".to_string(),
            ));
        }
        Ok(Self { interval, timeout })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("BUNDLEWISE_TLS_CERT");
        let key_pem = get_optional_env("BUNDLEWISE_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "BUNDLEWISE_TLS_*".to_string(),
                "Both BUNDLEWISE_TLS_CERT and BUNDLEWISE_TLS_KEY must be set together"
                    .to_string(),
            )),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BUNDLEWISE_DATABASE_URL")?;
        let host = get_env_or_default("BUNDLEWISE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BUNDLEWISE_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("BUNDLEWISE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BUNDLEWISE_PORT".to_string(), e.to_string())
            })?;
        let base_url = parse_base_url(&get_required_env("BUNDLEWISE_BASE_URL")?)?;

        let shopify = ShopifyAppConfig::from_env()?;
        let cors_allowed_origins = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        let bulk = BulkPollConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            shopify,
            cors_allowed_origins,
            bulk,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let scopes = get_optional_env("SHOPIFY_SCOPES").map_or_else(
            || DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            |raw| split_list(&raw),
        );

        Ok(Self {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            scopes,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate the public base URL and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("BUNDLEWISE_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BUNDLEWISE_BASE_URL".to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
