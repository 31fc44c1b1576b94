//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOWROOM_API_URL` - Base URL of the showroom REST API
//! - `SHOWROOM_BASE_URL` - Public URL for the storefront
//! - `IDENTITY_ISSUER` - Base URL of the OAuth identity provider
//! - `IDENTITY_CLIENT_ID` - OAuth client ID
//! - `IDENTITY_CLIENT_SECRET` - OAuth client secret (validated for entropy)
//! - `PAYMENTS_PUBLISHABLE_KEY` - Hosted payment widget publishable key
//!   (safe to expose in the browser)
//!
//! ## Optional
//! - `SHOWROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOWROOM_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
#[derive(Debug, Clone)]
pub struct ShowroomConfig {
    /// Base URL of the showroom REST API (no trailing slash)
    pub api_url: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// OAuth identity provider configuration
    pub identity: IdentityConfig,
    /// Hosted payment widget configuration
    pub payments: PaymentsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// OAuth identity provider configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Identity provider base URL (e.g. <https://auth.example.com>)
    pub issuer: String,
    /// OAuth client ID (safe to expose in browser)
    pub client_id: String,
    /// OAuth client secret (server-side only)
    pub client_secret: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Hosted payment widget configuration.
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    /// Publishable key handed to the browser-side widget
    pub publishable_key: String,
}

impl ShowroomConfig {
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

        let api_url = normalize_base_url(get_required_env("SHOWROOM_API_URL")?);
        let host = get_env_or_default("SHOWROOM_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOWROOM_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOWROOM_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOWROOM_PORT".to_string(), e.to_string()))?;
        let base_url = normalize_base_url(get_required_env("SHOWROOM_BASE_URL")?);

        let identity = IdentityConfig::from_env()?;
        let payments = PaymentsConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            api_url,
            host,
            port,
            base_url,
            identity,
            payments,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            issuer: normalize_base_url(get_required_env("IDENTITY_ISSUER")?),
            client_id: get_required_env("IDENTITY_CLIENT_ID")?,
            client_secret: get_validated_secret("IDENTITY_CLIENT_SECRET")?,
        })
    }
}

impl PaymentsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            publishable_key: get_required_env("PAYMENTS_PUBLISHABLE_KEY")?,
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Strip trailing slashes so URL joins never double up.
fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com/".to_string()),
            "https://api.example.com"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com".to_string()),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = ShowroomConfig {
            api_url: "http://localhost:8000".to_string(),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            identity: IdentityConfig {
                issuer: "https://auth.test".to_string(),
                client_id: "client_id".to_string(),
                client_secret: SecretString::from("client_secret"),
            },
            payments: PaymentsConfig {
                publishable_key: "pk_test_123".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_identity_config_debug_redacts_secret() {
        let config = IdentityConfig {
            issuer: "https://auth.test".to_string(),
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
        };

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("https://auth.test"));
        assert!(debug_output.contains("client_id_value"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
    }
}
