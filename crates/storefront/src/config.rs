//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_ANON_KEY` - Public anon key (sent as `apikey`)
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service-role key (validated secret)
//! - `STOREFRONT_DATABASE_URL` or `DATABASE_URL` - Supabase Postgres connection string
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHIPPING_BASE_COST` - Delivery fee below the threshold (default: 5.90)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotal for free delivery (default: 80)
//! - `PROMO_CODES` - e.g. `BIENVENUE=10%,NOEL=5` (percent or fixed euros)
//! - `BACKEND_TIMEOUT_SECS` - Database and HTTP timeout (default: 10)
//! - `LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use audie_boutique_core::{Money, ShippingRules};
use audie_boutique_supabase::SupabaseConfig;

use crate::services::PromoCodes;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHIPPING_BASE_COST: &str = "5.90";
const DEFAULT_FREE_SHIPPING_THRESHOLD: &str = "80";

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Supabase Postgres connection URL (contains password)
    pub database_url: SecretString,
    /// Supabase project settings
    pub supabase: SupabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Delivery pricing
    pub shipping: ShippingRules,
    /// Promo codes accepted at checkout
    pub promo_codes: PromoCodes,
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

impl StorefrontConfig {
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = parse_url("STOREFRONT_BASE_URL", &get_required_env("STOREFRONT_BASE_URL")?)?;
        let backend_timeout = parse_timeout(get_optional_env("BACKEND_TIMEOUT_SECS").as_deref())?;
        let supabase = supabase_from_env(backend_timeout)?;
        let shipping = ShippingRules::new(
            parse_money(
                "SHIPPING_BASE_COST",
                &get_env_or_default("SHIPPING_BASE_COST", DEFAULT_SHIPPING_BASE_COST),
            )?,
            parse_money(
                "FREE_SHIPPING_THRESHOLD",
                &get_env_or_default("FREE_SHIPPING_THRESHOLD", DEFAULT_FREE_SHIPPING_THRESHOLD),
            )?,
        );
        let promo_codes = get_optional_env("PROMO_CODES")
            .map(|raw| raw.parse::<PromoCodes>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("PROMO_CODES".to_string(), e.to_string()))?
            .unwrap_or_default();
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
            base_url,
            shipping,
            promo_codes,
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

    /// Whether the storefront is served over HTTPS (secure session cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn supabase_from_env(timeout: Duration) -> Result<SupabaseConfig, ConfigError> {
    let url = parse_url("SUPABASE_URL", &get_required_env("SUPABASE_URL")?)?;
    let anon_key = get_required_env("SUPABASE_ANON_KEY")?;
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

fn parse_money(key: &str, value: &str) -> Result<Money, ConfigError> {
    let amount = value
        .trim()
        .parse::<Money>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if amount.is_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "cannot be negative".to_string(),
        ));
    }
    Ok(amount)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!(
            parse_money("X", "5.90").unwrap(),
            "5.9".parse::<Money>().unwrap()
        );
        assert_eq!(parse_money("X", " 80 ").unwrap(), Money::from_cents(8000));
        assert!(parse_money("X", "-1").is_err());
        assert!(parse_money("X", "cinq").is_err());
    }

    #[test]
    fn test_default_shipping_rules() {
        let base = parse_money("X", DEFAULT_SHIPPING_BASE_COST).unwrap();
        let threshold = parse_money("X", DEFAULT_FREE_SHIPPING_THRESHOLD).unwrap();
        assert_eq!(base, Money::from_cents(590));
        assert_eq!(threshold, Money::from_cents(8000));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(None).unwrap(), Duration::from_secs(10));
        assert!(parse_timeout(Some("0")).is_err());
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }
}
