//! Tests for error module

use crate::error::Error;

#[test]
fn test_is_not_found() {
    let err = Error::NotFound("datasource".to_string());
    assert!(err.is_not_found());

    let err = Error::ClickHouseQuery("test".to_string());
    assert!(!err.is_not_found());
}

#[test]
fn test_is_validation() {
    let err = Error::Validation("URL is required for datasources".to_string());
    assert!(err.is_validation());

    let err = Error::ConfigIntegrity("customApi missing".to_string());
    assert!(!err.is_validation());
}

#[test]
fn test_is_connection_error() {
    let err = Error::ClickHouseConnection("test".to_string());
    assert!(err.is_connection_error());

    let err = Error::ClickHouseQuery("test".to_string());
    assert!(!err.is_connection_error());
}

#[test]
fn test_error_display() {
    let err = Error::Validation("URL is required for datasources".to_string());
    assert_eq!(format!("{}", err), "URL is required for datasources");

    let err = Error::NotFound("datasource 42".to_string());
    assert_eq!(format!("{}", err), "Resource not found: datasource 42");

    let err = Error::ClickHouseConnection("connection refused".to_string());
    assert_eq!(
        format!("{}", err),
        "ClickHouse connection error: connection refused"
    );
}
