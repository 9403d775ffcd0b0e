//! Configuration management for the procurement client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with PROCURE_ prefix

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Name recorded as requestor on new documents
    pub requestor: String,

    /// Remote API configuration
    pub api: ApiConfig,

    /// Rate-limit retry configuration
    pub retry: RetryConfig,

    /// Request concurrency configuration
    pub gateway: GatewayConfig,

    /// Session persistence configuration
    pub session: SessionConfig,

    /// Orchestrator configuration
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. "https://erp.example.com/api"
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Retries after the first 429 before giving up
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds
    pub max_delay_ms: u64,

    /// Factor applied to the delay after each retry
    pub backoff_factor: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Maximum number of requests in flight at once
    pub max_in_flight: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// File holding the bearer token and user profile
    pub store_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrchestratorConfig {
    /// Purchase order/payment count refresh interval while that stage is open
    pub po_poll_interval_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PROCURE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("requestor", "Unknown")?
            .set_default("api.base_url", "http://localhost:8080/api")?
            .set_default("api.timeout_secs", 30)?
            .set_default("retry.max_retries", 3)?
            .set_default("retry.initial_delay_ms", 500)?
            .set_default("retry.max_delay_ms", 8000)?
            .set_default("retry.backoff_factor", 2.0)?
            .set_default("gateway.max_in_flight", 6)?
            .set_default("session.store_path", ".procure/session.json")?
            .set_default("orchestrator.po_poll_interval_secs", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PROCURE_ prefix)
            .add_source(
                Environment::with_prefix("PROCURE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
            backoff_factor: 2.0,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { max_in_flight: 6 }
    }
}

impl OrchestratorConfig {
    pub fn po_poll_interval(&self) -> Duration {
        Duration::from_secs(self.po_poll_interval_secs.max(1))
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            po_poll_interval_secs: 30,
        }
    }
}
