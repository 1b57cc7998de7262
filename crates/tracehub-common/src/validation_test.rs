//! Tests for validation module

use serde_json::{json, Value};

use crate::types::DatasourceKind;
use crate::validation::validate_datasource;

fn error_of(kind: DatasourceKind, url: Option<&str>, config: Option<Value>) -> String {
    validate_datasource(kind, url, config.as_ref())
        .unwrap_err()
        .to_string()
}

fn custom_api(overrides: Value) -> Value {
    let mut custom = json!({
        "baseUrl": "https://traces.example.com/",
        "endpoints": {
            "search": { "path": "/api/search" },
            "searchByTraceId": { "path": "/api/traces/{traceId}" }
        }
    });
    if let (Some(base), Some(extra)) = (custom.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    json!({ "customApi": custom })
}

#[test]
fn test_tempo_and_jaeger_require_url() {
    for kind in [DatasourceKind::Tempo, DatasourceKind::Jaeger] {
        assert_eq!(error_of(kind, None, None), "URL is required for datasources");
        assert_eq!(error_of(kind, Some(""), None), "URL is required for datasources");
        assert!(validate_datasource(kind, Some("http://tempo:3200"), None).is_ok());
    }
}

#[test]
fn test_url_not_required_for_custom_api() {
    assert!(validate_datasource(DatasourceKind::CustomApi, None, None).is_ok());
}

#[test]
fn test_tempo_basic_auth_requires_both_fields() {
    let config = json!({ "authentication": { "type": "basic", "username": "admin" } });
    assert_eq!(
        error_of(DatasourceKind::Tempo, Some("http://tempo"), Some(config)),
        "Basic authentication requires username and password"
    );

    let config = json!({ "authentication": { "type": "basic", "username": "a", "password": "b" } });
    assert!(validate_datasource(DatasourceKind::Tempo, Some("http://tempo"), Some(&config)).is_ok());
}

#[test]
fn test_jaeger_bearer_requires_token() {
    let config = json!({ "authentication": { "type": "bearer" } });
    assert_eq!(
        error_of(DatasourceKind::Jaeger, Some("http://jaeger"), Some(config)),
        "Bearer authentication requires a token"
    );
}

#[test]
fn test_unknown_auth_type_rejected() {
    let config = json!({ "authentication": { "type": "digest", "token": "x" } });
    assert_eq!(
        error_of(DatasourceKind::Tempo, Some("http://tempo"), Some(config)),
        "Unsupported authentication type: digest"
    );

    let config = json!({ "authentication": { "type": "header", "headerName": "X", "value": "v" } });
    assert!(validate_datasource(DatasourceKind::Tempo, Some("http://tempo"), Some(&config)).is_err());
}

#[test]
fn test_clickhouse_requires_url_or_block() {
    assert_eq!(
        error_of(DatasourceKind::ClickHouse, None, None),
        "ClickHouse datasource requires either url or config.clickhouse"
    );
    assert!(validate_datasource(DatasourceKind::ClickHouse, Some("http://ch:8123"), None).is_ok());
}

#[test]
fn test_clickhouse_requires_each_field() {
    let full = json!({ "host": "ch", "database": "otel", "tableName": "otel_traces" });
    assert!(validate_datasource(
        DatasourceKind::ClickHouse,
        None,
        Some(&json!({ "clickhouse": full.clone() }))
    )
    .is_ok());

    for missing in ["host", "database", "tableName"] {
        let mut block = full.clone();
        block.as_object_mut().unwrap().remove(missing);
        assert_eq!(
            error_of(DatasourceKind::ClickHouse, Some("http://ch"), Some(json!({ "clickhouse": block }))),
            "ClickHouse configuration requires host, database, and tableName",
            "missing {missing}"
        );
    }
}

#[test]
fn test_custom_api_valid() {
    assert!(validate_datasource(DatasourceKind::CustomApi, None, Some(&custom_api(json!({})))).is_ok());
}

#[test]
fn test_custom_api_requires_base_url_or_url() {
    let config = custom_api(json!({ "baseUrl": "" }));
    assert_eq!(
        error_of(DatasourceKind::CustomApi, None, Some(config.clone())),
        "Custom API datasource requires either url or config.customApi.baseUrl"
    );
    assert!(validate_datasource(DatasourceKind::CustomApi, Some("https://b"), Some(&config)).is_ok());
}

#[test]
fn test_custom_api_requires_search_path() {
    let config = custom_api(json!({
        "endpoints": { "searchByTraceId": { "path": "/t/{traceId}" } }
    }));
    assert_eq!(
        error_of(DatasourceKind::CustomApi, None, Some(config)),
        "Custom API endpoints.search.path is required"
    );
}

#[test]
fn test_custom_api_trace_path_needs_placeholder() {
    let expected = "Custom API endpoints.searchByTraceId.path is required and must contain {traceId}";

    let missing = custom_api(json!({ "endpoints": { "search": { "path": "/s" } } }));
    assert_eq!(error_of(DatasourceKind::CustomApi, None, Some(missing)), expected);

    let no_placeholder = custom_api(json!({
        "endpoints": { "search": { "path": "/s" }, "searchByTraceId": { "path": "/traces/:id" } }
    }));
    assert_eq!(error_of(DatasourceKind::CustomApi, None, Some(no_placeholder)), expected);
}

#[test]
fn test_custom_api_attribute_names_capability() {
    let config = custom_api(json!({ "capabilities": { "getAttributeNames": true } }));
    assert_eq!(
        error_of(DatasourceKind::CustomApi, None, Some(config)),
        "Custom API endpoints.attributeNames.path is required when getAttributeNames is enabled"
    );

    let disabled = custom_api(json!({ "capabilities": { "getAttributeNames": false } }));
    assert!(validate_datasource(DatasourceKind::CustomApi, None, Some(&disabled)).is_ok());
}

#[test]
fn test_custom_api_attribute_values_capability() {
    let expected = "Custom API endpoints.attributeValues.path is required and must contain {attributeName} when getAttributeValues is enabled";
    let endpoints = |values_path: &str| {
        json!({
            "search": { "path": "/s" },
            "searchByTraceId": { "path": "/t/{traceId}" },
            "attributeValues": { "path": values_path }
        })
    };

    let config = custom_api(json!({
        "capabilities": { "getAttributeValues": true },
        "endpoints": endpoints("/attributes/values")
    }));
    assert_eq!(error_of(DatasourceKind::CustomApi, None, Some(config)), expected);

    let config = custom_api(json!({
        "capabilities": { "getAttributeValues": true },
        "endpoints": endpoints("/attributes/{attributeName}/values")
    }));
    assert!(validate_datasource(DatasourceKind::CustomApi, None, Some(&config)).is_ok());
}

#[test]
fn test_custom_api_filter_capability_needs_no_endpoint() {
    let config = custom_api(json!({ "capabilities": { "filterByAttributeExists": true } }));
    assert!(validate_datasource(DatasourceKind::CustomApi, None, Some(&config)).is_ok());
}

#[test]
fn test_custom_api_header_auth() {
    let config = custom_api(json!({ "authentication": { "type": "header", "value": "k" } }));
    assert_eq!(
        error_of(DatasourceKind::CustomApi, None, Some(config)),
        "Header authentication requires headerName and value"
    );

    let config = custom_api(json!({
        "authentication": { "type": "bearer", "value": "tok" }
    }));
    assert!(validate_datasource(DatasourceKind::CustomApi, None, Some(&config)).is_ok());
}

#[test]
fn test_malformed_config_is_validation_error() {
    let config = json!({ "clickhouse": { "host": "ch", "port": "not-a-port" } });
    let err = validate_datasource(DatasourceKind::ClickHouse, None, Some(&config)).unwrap_err();
    assert!(err.is_validation());
}
