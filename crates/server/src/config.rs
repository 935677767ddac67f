//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string for the order/customer store
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 5000)
//! - `MAP_API` - `OpenCage` geocoding API key (absent: every city maps to 0,0)
//! - `GEOCODER_BASE_URL` - Geocoding API base URL (default: <https://api.opencagedata.com>)
//! - `GEOCODER_TIMEOUT_SECS` - Per-city lookup timeout (default: 5)
//! - `GEOCODER_CONCURRENCY` - Lookups in flight per request (default: 8)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_GEOCODER_BASE_URL: &str = "https://api.opencagedata.com";
const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 5;
const DEFAULT_GEOCODER_CONCURRENCY: usize = 8;

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

/// Analytics server configuration.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Coordinate lookup configuration
    pub geocoder: GeocoderConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Geocoding API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeocoderConfig {
    /// `OpenCage` API key; `None` disables lookups.
    pub api_key: Option<SecretString>,
    /// API base URL, without trailing path.
    pub base_url: String,
    /// Upper bound on a single city lookup.
    pub timeout: Duration,
    /// Maximum lookups in flight for one request.
    pub concurrency: usize,
}

impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_GEOCODER_TIMEOUT_SECS),
            concurrency: DEFAULT_GEOCODER_CONCURRENCY,
        }
    }
}

impl GeocoderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_optional_env("MAP_API").filter(|key| !key.is_empty());
        if let Some(key) = &api_key {
            // A weak-looking key still gets a chance against the real API
            if let Err(e) = validate_secret_strength(key, "MAP_API") {
                tracing::warn!("MAP_API validation warning: {e}");
            }
        }

        let timeout_secs = get_env_or_default(
            "GEOCODER_TIMEOUT_SECS",
            &DEFAULT_GEOCODER_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("GEOCODER_TIMEOUT_SECS".to_string(), e.to_string()))?;

        let concurrency = get_env_or_default(
            "GEOCODER_CONCURRENCY",
            &DEFAULT_GEOCODER_CONCURRENCY.to_string(),
        )
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidEnvVar("GEOCODER_CONCURRENCY".to_string(), e.to_string()))?;
        if concurrency == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GEOCODER_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key: api_key.map(SecretString::from),
            base_url: get_env_or_default("GEOCODER_BASE_URL", DEFAULT_GEOCODER_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(timeout_secs),
            concurrency,
        })
    }
}

impl AnalyticsConfig {
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

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let geocoder = GeocoderConfig::from_env()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            geocoder,
            json_logs,
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

    /// Returns a reference to the geocoder configuration.
    #[must_use]
    pub const fn geocoder(&self) -> &GeocoderConfig {
        &self.geocoder
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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

    // Real API keys have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
