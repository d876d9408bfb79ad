//! Cart API client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKET_API_BASE_URL` - Base URL of the marketplace API
//! - `MARKET_API_TOKEN` - Bearer token for authenticated calls
//!
//! ## Optional
//! - `MARKET_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Marketplace API client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct MarketApiConfig {
    /// Base URL of the marketplace API.
    pub base_url: String,
    /// Bearer token for authenticated calls.
    pub api_token: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for MarketApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MarketApiConfig {
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

        let base_url = get_required_env("MARKET_API_BASE_URL")?;
        let api_token = SecretString::from(get_required_env("MARKET_API_TOKEN")?);
        let timeout_secs = get_env_or_default("MARKET_API_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MARKET_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
