//! Tests for config module

use std::time::Duration;

use crate::config::{ApiConfig, Config, ConnectivityConfig, SecurityConfig};

#[test]
fn test_default_config() {
    let config = Config::default();

    // Check API defaults
    assert_eq!(config.api.host, "0.0.0.0");
    assert_eq!(config.api.port, 8080);
    assert_eq!(config.api.timeout_secs, 30);

    // Check connectivity defaults
    assert_eq!(config.connectivity.http_timeout_ms, 5000);
    assert_eq!(config.connectivity.clickhouse_timeout_ms, 5000);
    assert_eq!(config.connectivity.probe_lookback_hours, 24);

    // Check security defaults
    assert!(!config.security.mask_secrets_in_responses);
}

#[test]
fn test_api_config_default() {
    let config = ApiConfig::default();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.timeout_secs, 30);
}

#[test]
fn test_connectivity_timeouts() {
    let config = ConnectivityConfig::default();
    assert_eq!(config.http_timeout(), Duration::from_secs(5));
    assert_eq!(config.clickhouse_timeout(), Duration::from_secs(5));
}

#[test]
fn test_security_config_deserializes_partial() {
    let config: SecurityConfig =
        serde_json::from_str(r#"{"mask_secrets_in_responses": true}"#).unwrap();
    assert!(config.mask_secrets_in_responses);
}

#[test]
fn test_load_or_default() {
    // Should not panic even if config file doesn't exist
    let config = Config::load_or_default();
    assert_eq!(config.connectivity.probe_lookback_hours, 24);
}
