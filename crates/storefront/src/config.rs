//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_UPLOAD_DIR` - Product image directory (default: `crates/storefront/static/images/products`)
//! - `STOREFRONT_ALLOW_GUESTS` - Let anonymous visitors keep carts and favorites (default: true)
//! - `STOREFRONT_DB_TIMEOUT_MS` - Per-attempt storage timeout (default: 5000)
//! - `STOREFRONT_DB_MAX_RETRIES` - Retries after the first attempt (default: 2)
//! - `STOREFRONT_DB_RETRY_BASE_MS` - First retry backoff (default: 50)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::db::StoragePolicy;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default product image directory, relative to the workspace root.
pub const DEFAULT_UPLOAD_DIR: &str = "crates/storefront/static/images/products";

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

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session secret
    pub session_secret: SecretString,
    /// Directory product images are written to and served from
    pub upload_dir: PathBuf,
    /// Whether anonymous visitors may own carts and favorites
    pub allow_guests: bool,
    /// Timeout and retry settings for storage calls
    pub storage: StoragePolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: String,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("session_secret", &"[REDACTED]")
            .field("upload_dir", &self.upload_dir)
            .field("allow_guests", &self.allow_guests)
            .field("storage", &self.storage)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env.database_url("STOREFRONT_DATABASE_URL")?;
        let host = env.parsed::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = env.validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let upload_dir = PathBuf::from(env.or_default("STOREFRONT_UPLOAD_DIR", DEFAULT_UPLOAD_DIR));
        let allow_guests = env.flag("STOREFRONT_ALLOW_GUESTS", true)?;
        let storage = StoragePolicy {
            timeout: Duration::from_millis(env.parsed("STOREFRONT_DB_TIMEOUT_MS", "5000")?),
            max_retries: env.parsed("STOREFRONT_DB_MAX_RETRIES", "2")?,
            base_backoff: Duration::from_millis(env.parsed("STOREFRONT_DB_RETRY_BASE_MS", "50")?),
        };
        if storage.timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_DB_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.or_default("SENTRY_ENVIRONMENT", "development");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            upload_dir,
            allow_guests,
            storage,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to a default.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got {other:?}"),
            )),
        }
    }

    /// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Session secret accepted by [`StorefrontConfig::from_lookup`], shared by
/// the config and router tests.
#[cfg(test)]
pub(crate) const TEST_SESSION_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6vG8%hJ1";

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GOOD_SECRET: &str = TEST_SESSION_SECRET;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/litus"),
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("STOREFRONT_SESSION_SECRET", GOOD_SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&minimal())).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.allow_guests);
        assert_eq!(config.upload_dir, PathBuf::from(DEFAULT_UPLOAD_DIR));
        assert_eq!(config.storage.timeout, Duration::from_millis(5000));
        assert_eq!(config.storage.max_retries, 2);
        assert_eq!(config.storage.base_backoff, Duration::from_millis(50));
        assert_eq!(config.sentry_environment, "development");
        assert!(!config.is_https());
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("STOREFRONT_PORT", "8080"),
            ("STOREFRONT_ALLOW_GUESTS", "off"),
            ("STOREFRONT_DB_TIMEOUT_MS", "250"),
            ("STOREFRONT_DB_MAX_RETRIES", "0"),
            ("STOREFRONT_BASE_URL", "https://litus.com.tr"),
        ]);
        let config = StorefrontConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.allow_guests);
        assert_eq!(config.storage.timeout, Duration::from_millis(250));
        assert_eq!(config.storage.max_retries, 0);
        assert!(config.is_https());
    }

    #[test]
    fn test_database_url_fallback() {
        let vars = [
            ("DATABASE_URL", "postgres://fly/litus"),
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("STOREFRONT_SESSION_SECRET", GOOD_SECRET),
        ];
        let config = StorefrontConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/litus");
    }

    #[test]
    fn test_missing_required() {
        let vars = [("STOREFRONT_BASE_URL", "http://localhost:3000")];
        let err = StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STOREFRONT_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = minimal();
        vars.push(("STOREFRONT_ALLOW_GUESTS", "maybe"));
        assert!(matches!(
            StorefrontConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(..))
        ));

        let mut vars = minimal();
        vars.push(("STOREFRONT_DB_TIMEOUT_MS", "0"));
        assert!(matches!(
            StorefrontConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(..))
        ));

        let mut vars = minimal();
        vars.push(("STOREFRONT_BASE_URL", "not a url"));
        assert!(matches!(
            StorefrontConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StorefrontConfig::from_lookup(lookup(&minimal())).unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(GOOD_SECRET));
        assert!(!debug_output.contains("postgres://localhost/litus"));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-api-key-here", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
        assert!(validate_secret_strength(&"a".repeat(33), "TEST_VAR").is_err());
        assert!(validate_secret_strength(GOOD_SECRET, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "TEST_SESSION").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_shared_test_secret_is_accepted() {
        assert!(TEST_SESSION_SECRET.len() >= MIN_SESSION_SECRET_LENGTH);
        let secret = SecretString::from(TEST_SESSION_SECRET);
        assert!(validate_session_secret(&secret, "STOREFRONT_SESSION_SECRET").is_ok());
        assert!(validate_secret_strength(TEST_SESSION_SECRET, "STOREFRONT_SESSION_SECRET").is_ok());
    }
}
