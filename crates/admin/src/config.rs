//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_ANON_KEY` - Public anon key (sent as `apikey`)
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service-role key for edge functions (HIGH PRIVILEGE)
//! - `ADMIN_DATABASE_URL` or `DATABASE_URL` - Supabase Postgres connection string
//! - `STOREFRONT_BASE_URL` - Public shop URL, used in notification links
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `BACKEND_TIMEOUT_SECS` - Database and HTTP timeout (default: 10)
//! - `NOTIFICATION_LOCALE` - `fr` or `en` (default: fr)
//! - `ALLOW_CANCEL_AFTER_SHIPPING` - Permit shipped -> cancelled (default: false)
//! - `LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use audie_boutique_core::{Locale, TransitionPolicy};
use audie_boutique_supabase::SupabaseConfig;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
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

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Supabase Postgres connection URL (contains password)
    pub database_url: SecretString,
    /// Supabase project settings (auth and edge functions)
    pub supabase: SupabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public shop URL; order links in notifications point here
    pub storefront_base_url: Url,
    /// Language of customer notifications
    pub notification_locale: Locale,
    /// Which status transitions staff may apply
    pub transition_policy: TransitionPolicy,
    /// Timeout for database statements and HTTP calls
    pub backend_timeout: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
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

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let backend_timeout = parse_timeout(get_optional_env("BACKEND_TIMEOUT_SECS").as_deref())?;
        let supabase = supabase_from_env(backend_timeout)?;
        let storefront_base_url =
            parse_url("STOREFRONT_BASE_URL", &get_required_env("STOREFRONT_BASE_URL")?)?;
        let notification_locale = get_env_or_default("NOTIFICATION_LOCALE", "fr")
            .parse::<Locale>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("NOTIFICATION_LOCALE".to_string(), e.to_string())
            })?;
        let transition_policy = TransitionPolicy {
            allow_cancel_after_shipping: parse_bool(
                "ALLOW_CANCEL_AFTER_SHIPPING",
                get_optional_env("ALLOW_CANCEL_AFTER_SHIPPING").as_deref(),
            )?,
        };
        let log_format = parse_log_format(get_optional_env("LOG_FORMAT").as_deref());
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
            supabase,
            host,
            port,
            storefront_base_url,
            notification_locale,
            transition_policy,
            backend_timeout,
            log_format,
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

// =============================================================================
// Helper Functions
// =============================================================================

fn supabase_from_env(timeout: Duration) -> Result<SupabaseConfig, ConfigError> {
    let url = parse_url("SUPABASE_URL", &get_required_env("SUPABASE_URL")?)?;
    let anon_key = get_required_env("SUPABASE_ANON_KEY")?;
    if let Err(e) = validate_secret_strength(&anon_key, "SUPABASE_ANON_KEY") {
        tracing::warn!("SUPABASE_ANON_KEY validation warning: {e}");
    }
    Ok(SupabaseConfig {
        url,
        anon_key: SecretString::from(anon_key),
        service_role_key: get_validated_secret("SUPABASE_SERVICE_ROLE_KEY")?,
        timeout,
    })
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

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

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_timeout(value: Option<&str>) -> Result<Duration, ConfigError> {
    let secs = match value {
        None => DEFAULT_BACKEND_TIMEOUT_SECS,
        Some(raw) => raw.parse::<u64>().map_err(|e| {
            ConfigError::InvalidEnvVar("BACKEND_TIMEOUT_SECS".to_string(), e.to_string())
        })?,
    };
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "BACKEND_TIMEOUT_SECS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool, ConfigError> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("" | "0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got {other}"),
        )),
    }
}

fn parse_log_format(value: Option<&str>) -> LogFormat {
    match value {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
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
            #[allow(clippy::cast_precision_loss)]
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
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
