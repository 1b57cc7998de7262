//! Tests for types module

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::types::{ConnectivityResult, Datasource, DatasourceKind, NewDatasource};

#[test]
fn test_kind_from_str() {
    assert_eq!("tempo".parse::<DatasourceKind>().unwrap(), DatasourceKind::Tempo);
    assert_eq!("jaeger".parse::<DatasourceKind>().unwrap(), DatasourceKind::Jaeger);
    assert_eq!("clickhouse".parse::<DatasourceKind>().unwrap(), DatasourceKind::ClickHouse);
    assert_eq!("custom_api".parse::<DatasourceKind>().unwrap(), DatasourceKind::CustomApi);

    let err = "zipkin".parse::<DatasourceKind>().unwrap_err();
    assert_eq!(err.to_string(), "Unsupported datasource type: zipkin");
}

#[test]
fn test_kind_serialization() {
    assert_eq!(serde_json::to_string(&DatasourceKind::ClickHouse).unwrap(), "\"clickhouse\"");
    assert_eq!(serde_json::to_string(&DatasourceKind::CustomApi).unwrap(), "\"custom_api\"");
    assert_eq!(DatasourceKind::CustomApi.to_string(), "custom_api");
}

#[test]
fn test_kind_requires_url() {
    assert!(DatasourceKind::Tempo.requires_url());
    assert!(DatasourceKind::Jaeger.requires_url());
    assert!(!DatasourceKind::ClickHouse.requires_url());
    assert!(!DatasourceKind::CustomApi.requires_url());
}

#[test]
fn test_new_datasource_wire_format() {
    let input: NewDatasource = serde_json::from_value(json!({
        "name": "tempo-prod",
        "type": "tempo",
        "url": "http://tempo:3200"
    }))
    .unwrap();

    assert_eq!(input.kind, DatasourceKind::Tempo);
    assert_eq!(input.description, None);
    assert!(input.config.is_none());
}

#[test]
fn test_datasource_serialization() {
    let now = Utc::now();
    let datasource = Datasource {
        id: Uuid::new_v4(),
        organisation_id: Uuid::new_v4(),
        name: "ch".to_string(),
        description: None,
        kind: DatasourceKind::ClickHouse,
        url: Some(String::new()),
        config: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    };

    let wire = serde_json::to_value(&datasource).unwrap();
    assert_eq!(wire["type"], "clickhouse");
    assert!(wire.get("organisationId").is_some());
    assert!(wire.get("config").is_none());
    assert_eq!(datasource.url(), None);
}

#[test]
fn test_connectivity_result() {
    assert_eq!(
        ConnectivityResult::ok(),
        ConnectivityResult { success: true, message: "Connection successful".to_string() }
    );
    let unsupported = ConnectivityResult::unsupported();
    assert!(!unsupported.success);
    assert_eq!(unsupported.message, "Unsupported datasource type");
}
