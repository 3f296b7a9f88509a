//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TOTE_API_URL` - Base URL of the storefront API (e.g., `https://api.tote.shop`)
//!
//! ## Optional
//! - `TOTE_DELIVERY_FEE` - Flat delivery fee added at checkout (default: 10)
//! - `TOTE_CURRENCY` - ISO currency code for display (default: USD)
//! - `TOTE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `TOTE_SESSION_TOKEN` - Session token to start signed in with
//! - `TOTE_LOCAL_CATALOG` - Path to a bundled JSON product list
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use tote_core::CurrencyCode;

const DEFAULT_DELIVERY_FEE: &str = "10";
const DEFAULT_TIMEOUT_SECS: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
///
/// Implements `Debug` manually to redact the session token.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote storefront API
    pub api_url: Url,
    /// Flat delivery fee added to every order
    pub delivery_fee: Decimal,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Timeout applied to every remote request
    pub request_timeout: Duration,
    /// Token to sign in with at startup
    pub session_token: Option<SecretString>,
    /// Bundled product list merged ahead of the remote catalog
    pub local_catalog: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("delivery_fee", &self.delivery_fee)
            .field("currency", &self.currency)
            .field("request_timeout", &self.request_timeout)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("local_catalog", &self.local_catalog)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    /// A session token is invalid when it cannot be sent as a header value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let api_url = vars.parsed::<Url>("TOTE_API_URL", None)?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "TOTE_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let delivery_fee = vars.parsed::<Decimal>("TOTE_DELIVERY_FEE", Some(DEFAULT_DELIVERY_FEE))?;
        if delivery_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "TOTE_DELIVERY_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let currency = vars.parsed::<CurrencyCode>("TOTE_CURRENCY", Some("USD"))?;
        let timeout_secs = vars.parsed::<u64>("TOTE_REQUEST_TIMEOUT_SECS", Some(DEFAULT_TIMEOUT_SECS))?;

        let session_token = vars
            .optional("TOTE_SESSION_TOKEN")
            .map(|token| {
                let token = token.trim();
                validate_header_token(token, "TOTE_SESSION_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token.to_string()))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            delivery_fee,
            currency,
            request_timeout: Duration::from_secs(timeout_secs),
            session_token,
            local_catalog: vars.optional("TOTE_LOCAL_CATALOG").map(PathBuf::from),
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parsed("SENTRY_SAMPLE_RATE", Some("1.0"))?,
            sentry_traces_sample_rate: vars.parsed("SENTRY_TRACES_SAMPLE_RATE", Some("0.0"))?,
        })
    }

    /// The session token, if one was configured.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|t| t.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source wrapper with the usual accessors.
struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: Option<&str>) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = match (self.optional(key), default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.to_string(),
            (None, None) => return Err(ConfigError::MissingEnvVar(key.to_string())),
        };
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Tokens are issued by the API and opaque here. Only reject what cannot
/// travel in the `token` header.
fn validate_header_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must not contain whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}
