//! Configuration for Tracehub services

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Connectivity probe configuration
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Secrets-at-rest configuration
    #[serde(default)]
    pub security: SecurityConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Connection test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Timeout for HTTP probes (Tempo, Jaeger, Custom API)
    #[serde(default = "default_probe_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Timeout for the ClickHouse `SELECT 1` probe
    #[serde(default = "default_probe_timeout_ms")]
    pub clickhouse_timeout_ms: u64,

    /// Lookback window of the Custom API search probe
    #[serde(default = "default_lookback_hours")]
    pub probe_lookback_hours: i64,
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_lookback_hours() -> i64 {
    24
}

impl ConnectivityConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn clickhouse_timeout(&self) -> Duration {
        Duration::from_millis(self.clickhouse_timeout_ms)
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            http_timeout_ms: default_probe_timeout_ms(),
            clickhouse_timeout_ms: default_probe_timeout_ms(),
            probe_lookback_hours: default_lookback_hours(),
        }
    }
}

/// Secrets-at-rest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Base64-encoded 32-byte key used to encrypt datasource credentials
    #[serde(default = "default_encryption_key")]
    pub encryption_key: Option<String>,

    /// Return masked rather than decrypted credentials from read endpoints
    #[serde(default)]
    pub mask_secrets_in_responses: bool,
}

fn default_encryption_key() -> Option<String> {
    std::env::var("TRACEHUB_ENCRYPTION_KEY").ok()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            encryption_key: default_encryption_key(),
            mask_secrets_in_responses: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, crate::Error> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name("config.local").required(false))
            .add_source(config::Environment::with_prefix("TRACEHUB").separator("__"))
            .build()
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration with defaults (for when config file doesn't exist)
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
