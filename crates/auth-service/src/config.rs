//! Configuration management for the authentication service.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The application identifier and the verification-authority API key have
//! no defaults: their absence is a configuration error at startup, not a
//! runtime fault.

use anyhow::{Context, Result};
use std::env;

/// Default base URL of the identity-proof verification authority.
pub const DEFAULT_VERIFIER_BASE_URL: &str = "https://developer.worldcoin.org/api/v2";

/// Default single-use nonce lifetime (1 hour).
pub const DEFAULT_NONCE_TTL_SECS: u64 = 3600;

/// Default interval between expired-nonce sweeps (1 hour).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Default bound on outbound verification calls.
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Application identifier registered with the verification authority
    pub app_id: String,

    /// API key for the verification authority
    pub api_key: String,

    /// Base URL of the verification authority
    pub verifier_base_url: String,

    /// Challenge nonce time-to-live in seconds
    pub nonce_ttl_secs: u64,

    /// Interval between expired-nonce sweeps in seconds
    pub sweep_interval_secs: u64,

    /// Timeout for outbound verification calls in seconds
    pub verify_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            app_id: env::var("WORLD_APP_ID").context("WORLD_APP_ID must be set")?,

            api_key: env::var("WORLD_API_KEY").context("WORLD_API_KEY must be set")?,

            verifier_base_url: env::var("VERIFIER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_VERIFIER_BASE_URL.to_string()),

            nonce_ttl_secs: env::var("NONCE_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_NONCE_TTL_SECS.to_string())
                .parse()
                .context("Invalid NONCE_TTL_SECS")?,

            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .context("Invalid SWEEP_INTERVAL_SECS")?,

            verify_timeout_secs: env::var("VERIFY_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_VERIFY_TIMEOUT_SECS.to_string())
                .parse()
                .context("Invalid VERIFY_TIMEOUT_SECS")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.app_id.is_empty() {
            anyhow::bail!("WORLD_APP_ID must not be empty");
        }

        if self.api_key.is_empty() {
            anyhow::bail!("WORLD_API_KEY must not be empty");
        }

        if self.nonce_ttl_secs == 0 {
            anyhow::bail!("NONCE_TTL_SECS must be greater than 0");
        }

        if self.verify_timeout_secs == 0 {
            anyhow::bail!("VERIFY_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// App id truncated for log lines and status responses.
    pub fn abbreviated_app_id(&self) -> String {
        match self.app_id.get(..8) {
            Some(prefix) => format!("{}...", prefix),
            None => self.app_id.clone(),
        }
    }
}
