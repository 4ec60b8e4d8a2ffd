//! Relay configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `OTPLESS_CLIENT_ID` - OTPless application client ID
//! - `OTPLESS_CLIENT_SECRET` - OTPless application client secret
//! - `SHOPIFY_STORE_URL` - Store URL (e.g., <https://your-store.myshopify.com>)
//! - `SHOPIFY_ACCESS_TOKEN` - Admin API access token (custom app)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `OTPLESS_API_URL` - OTPless API base (default: <https://api.otpless.com>)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2023-10)
//! - `SHOPIFY_STOREFRONT_URL` - Customer-facing domain for Multipass logins
//!   and CORS (default: `SHOPIFY_STORE_URL`)
//! - `SHOPIFY_MULTIPASS_SECRET` - Enables Multipass logins (Shopify Plus)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_OTPLESS_API_URL: &str = "https://api.otpless.com";
const DEFAULT_SHOPIFY_API_VERSION: &str = "2023-10";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Relay application configuration.
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// OTPless verification API configuration
    pub otpless: OtplessConfig,
    /// Shopify Admin API and Multipass configuration
    pub shopify: ShopifyConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry performance monitoring sample rate
    pub sentry_traces_sample_rate: f32,
}

/// OTPless API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct OtplessConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Application client ID
    pub client_id: String,
    /// Application client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for OtplessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtplessConfig")
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Shopify configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Store URL used for Admin API calls, without trailing slash
    pub store_url: String,
    /// Admin API version (e.g., 2023-10)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
    /// Customer-facing storefront URL, without trailing slash
    pub storefront_url: String,
    /// Multipass secret; `None` disables Multipass logins
    pub multipass_secret: Option<SecretString>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_url", &self.store_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("storefront_url", &self.storefront_url)
            .field(
                "multipass_secret",
                &self.multipass_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl RelayConfig {
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

        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`RelayConfig::from_env`].
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env
            .or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let sentry_traces_sample_rate = env
            .or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            otpless: OtplessConfig::from_env(&env)?,
            shopify: ShopifyConfig::from_env(&env)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl OtplessConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_base_url(env, "OTPLESS_API_URL", Some(DEFAULT_OTPLESS_API_URL))?,
            client_id: env.required("OTPLESS_CLIENT_ID")?,
            client_secret: env.validated_secret("OTPLESS_CLIENT_SECRET")?,
        })
    }
}

impl ShopifyConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let store_url = get_base_url(env, "SHOPIFY_STORE_URL", None)?;
        let storefront_url = match env.optional("SHOPIFY_STOREFRONT_URL") {
            Some(_) => get_base_url(env, "SHOPIFY_STOREFRONT_URL", None)?,
            None => store_url.clone(),
        };

        let multipass_secret = match env.optional("SHOPIFY_MULTIPASS_SECRET") {
            Some(value) if value.is_empty() => {
                return Err(ConfigError::InvalidEnvVar(
                    "SHOPIFY_MULTIPASS_SECRET".to_string(),
                    "must not be empty when set".to_string(),
                ));
            }
            Some(_) => Some(env.validated_secret("SHOPIFY_MULTIPASS_SECRET")?),
            None => None,
        };

        Ok(Self {
            store_url,
            api_version: env.or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
            access_token: env.validated_secret("SHOPIFY_ACCESS_TOKEN")?,
            storefront_url,
            multipass_secret,
        })
    }

    /// Base URL of the Admin REST API for the configured version.
    #[must_use]
    pub fn admin_api_url(&self) -> String {
        format!("{}/admin/api/{}", self.store_url, self.api_version)
    }

    /// Whether Multipass logins are enabled.
    #[must_use]
    pub const fn multipass_enabled(&self) -> bool {
        self.multipass_secret.is_some()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the config sections.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required environment variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional environment variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get an environment variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Parse an absolute http(s) URL and strip any trailing slash.
fn get_base_url(env: &Env<'_>, key: &str, default: Option<&str>) -> Result<String, ConfigError> {
    let value = match (env.optional(key), default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.to_string(),
        (None, None) => return Err(ConfigError::MissingEnvVar(key.to_string())),
    };

    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
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
