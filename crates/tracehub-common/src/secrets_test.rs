//! Tests for secrets module

use serde_json::json;

use crate::crypto::{ChaChaCipher, SecretCipher};
use crate::secrets::{decrypt_config, encrypt_config, mask_config_for_response, MASKED_VALUE};
use crate::types::DatasourceKind;

fn cipher() -> ChaChaCipher {
    ChaChaCipher::new(&[42u8; 32]).unwrap()
}

fn clickhouse_config() -> serde_json::Value {
    json!({
        "clickhouse": {
            "host": "ch.internal",
            "port": 8123,
            "database": "otel",
            "tableName": "otel_traces",
            "username": "reader",
            "password": "hunter2",
            "protocol": "http"
        }
    })
}

#[test]
fn test_clickhouse_password_encrypted() {
    let c = cipher();
    let encrypted = encrypt_config(&c, DatasourceKind::ClickHouse, Some(&clickhouse_config()))
        .unwrap()
        .unwrap();

    let password = encrypted["clickhouse"]["password"].as_str().unwrap();
    assert!(c.is_encrypted(password));
    assert_eq!(encrypted["clickhouse"]["username"], "reader");
    assert_eq!(encrypted["clickhouse"]["tableName"], "otel_traces");
}

#[test]
fn test_round_trip_restores_plaintext() {
    let c = cipher();
    let original = clickhouse_config();
    let encrypted = encrypt_config(&c, DatasourceKind::ClickHouse, Some(&original)).unwrap();
    let decrypted = decrypt_config(&c, DatasourceKind::ClickHouse, encrypted.as_ref()).unwrap();
    assert_eq!(decrypted, Some(original));
}

#[test]
fn test_encrypt_is_idempotent() {
    let c = cipher();
    let config = json!({
        "authentication": { "type": "bearer", "token": "abc123" }
    });
    let once = encrypt_config(&c, DatasourceKind::Tempo, Some(&config)).unwrap();
    let twice = encrypt_config(&c, DatasourceKind::Tempo, once.as_ref()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_tempo_basic_encrypts_password_only() {
    let c = cipher();
    let config = json!({
        "authentication": { "type": "basic", "username": "admin", "password": "pw" }
    });
    let encrypted = encrypt_config(&c, DatasourceKind::Tempo, Some(&config))
        .unwrap()
        .unwrap();
    assert_eq!(encrypted["authentication"]["username"], "admin");
    assert!(c.is_encrypted(encrypted["authentication"]["password"].as_str().unwrap()));
}

#[test]
fn test_jaeger_bearer_encrypts_token() {
    let c = cipher();
    let config = json!({
        "authentication": { "type": "bearer", "token": "tok" }
    });
    let encrypted = encrypt_config(&c, DatasourceKind::Jaeger, Some(&config))
        .unwrap()
        .unwrap();
    assert!(c.is_encrypted(encrypted["authentication"]["token"].as_str().unwrap()));
}

#[test]
fn test_custom_api_header_encrypts_value() {
    let c = cipher();
    let config = json!({
        "customApi": {
            "baseUrl": "https://traces.example.com",
            "authentication": { "type": "header", "headerName": "X-Api-Key", "value": "k" },
            "endpoints": { "search": { "path": "/search" } }
        }
    });
    let encrypted = encrypt_config(&c, DatasourceKind::CustomApi, Some(&config))
        .unwrap()
        .unwrap();
    let auth = &encrypted["customApi"]["authentication"];
    assert_eq!(auth["headerName"], "X-Api-Key");
    assert!(c.is_encrypted(auth["value"].as_str().unwrap()));
    assert_eq!(encrypted["customApi"]["endpoints"]["search"]["path"], "/search");
}

#[test]
fn test_custom_api_basic_encrypts_password() {
    let c = cipher();
    let config = json!({
        "customApi": {
            "authentication": { "type": "basic", "username": "u", "password": "p" }
        }
    });
    let encrypted = encrypt_config(&c, DatasourceKind::CustomApi, Some(&config))
        .unwrap()
        .unwrap();
    assert!(c.is_encrypted(
        encrypted["customApi"]["authentication"]["password"]
            .as_str()
            .unwrap()
    ));
}

#[test]
fn test_missing_config_passes_through() {
    let c = cipher();
    assert_eq!(encrypt_config(&c, DatasourceKind::Tempo, None).unwrap(), None);
    assert_eq!(decrypt_config(&c, DatasourceKind::Tempo, None).unwrap(), None);
    assert_eq!(mask_config_for_response(DatasourceKind::Tempo, None).unwrap(), None);
}

#[test]
fn test_decrypt_leaves_plaintext_alone() {
    let c = cipher();
    let config = clickhouse_config();
    let decrypted = decrypt_config(&c, DatasourceKind::ClickHouse, Some(&config)).unwrap();
    assert_eq!(decrypted, Some(config));
}

#[test]
fn test_mask_replaces_secret() {
    let masked = mask_config_for_response(DatasourceKind::ClickHouse, Some(&clickhouse_config()))
        .unwrap()
        .unwrap();
    assert_eq!(masked["clickhouse"]["password"], MASKED_VALUE);
    assert_eq!(masked["clickhouse"]["host"], "ch.internal");
}

#[test]
fn test_unknown_fields_survive() {
    let c = cipher();
    let config = json!({
        "authentication": { "type": "basic", "username": "a", "password": "b", "realm": "r" },
        "search": { "spss": 3 }
    });
    let encrypted = encrypt_config(&c, DatasourceKind::Tempo, Some(&config))
        .unwrap()
        .unwrap();
    assert_eq!(encrypted["authentication"]["realm"], "r");
    assert_eq!(encrypted["search"]["spss"], 3);
}

#[test]
fn test_bearer_value_is_encrypted_and_masked() {
    let c = cipher();
    for kind in [DatasourceKind::Tempo, DatasourceKind::Jaeger] {
        let config = json!({ "authentication": { "type": "bearer", "value": "s3cret" } });

        let encrypted = encrypt_config(&c, kind, Some(&config)).unwrap().unwrap();
        let stored = encrypted["authentication"]["value"].as_str().unwrap();
        assert!(c.is_encrypted(stored), "{kind}");
        assert_ne!(stored, "s3cret");

        let masked = mask_config_for_response(kind, Some(&config)).unwrap().unwrap();
        assert_eq!(masked["authentication"]["value"], MASKED_VALUE, "{kind}");

        let decrypted = decrypt_config(&c, kind, Some(&encrypted)).unwrap();
        assert_eq!(decrypted, Some(config));
    }
}

#[test]
fn test_every_credential_field_covered_regardless_of_type() {
    let c = cipher();
    let config = json!({
        "authentication": {
            "type": "bearer",
            "username": "u",
            "password": "stale",
            "token": "tok",
            "value": "v"
        }
    });

    let encrypted = encrypt_config(&c, DatasourceKind::Tempo, Some(&config))
        .unwrap()
        .unwrap();
    let auth = &encrypted["authentication"];
    assert_eq!(auth["username"], "u");
    for field in ["password", "token", "value"] {
        assert!(c.is_encrypted(auth[field].as_str().unwrap()), "{field}");
    }

    let masked = mask_config_for_response(DatasourceKind::Tempo, Some(&config))
        .unwrap()
        .unwrap();
    for field in ["password", "token", "value"] {
        assert_eq!(masked["authentication"][field], MASKED_VALUE, "{field}");
    }
}

#[test]
fn test_custom_api_bearer_token_and_value_encrypted() {
    let c = cipher();
    let config = json!({
        "customApi": {
            "authentication": { "type": "bearer", "token": "t", "value": "v" }
        }
    });
    let encrypted = encrypt_config(&c, DatasourceKind::CustomApi, Some(&config))
        .unwrap()
        .unwrap();
    let auth = &encrypted["customApi"]["authentication"];
    assert!(c.is_encrypted(auth["token"].as_str().unwrap()));
    assert!(c.is_encrypted(auth["value"].as_str().unwrap()));
}
