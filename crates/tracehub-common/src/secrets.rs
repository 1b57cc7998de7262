//! Encryption, decryption and masking of credentials inside datasource configs

use serde_json::Value;

use crate::backend::BackendConfig;
use crate::crypto::SecretCipher;
use crate::error::Result;
use crate::types::DatasourceKind;

/// Replacement shown in place of a credential on masked responses
pub const MASKED_VALUE: &str = "***";

/// Encrypt every sensitive field not already encrypted
pub fn encrypt_config(
    cipher: &dyn SecretCipher,
    kind: DatasourceKind,
    config: Option<&Value>,
) -> Result<Option<Value>> {
    transform(kind, config, |secret| {
        if cipher.is_encrypted(secret) {
            Ok(secret.to_string())
        } else {
            cipher.encrypt(secret)
        }
    })
}

/// Decrypt every sensitive field that carries the encryption marker
pub fn decrypt_config(
    cipher: &dyn SecretCipher,
    kind: DatasourceKind,
    config: Option<&Value>,
) -> Result<Option<Value>> {
    transform(kind, config, |secret| {
        if cipher.is_encrypted(secret) {
            cipher.decrypt(secret)
        } else {
            Ok(secret.to_string())
        }
    })
}

/// Replace every sensitive field with [`MASKED_VALUE`]
pub fn mask_config_for_response(kind: DatasourceKind, config: Option<&Value>) -> Result<Option<Value>> {
    transform(kind, config, |_| Ok(MASKED_VALUE.to_string()))
}

fn transform<F>(kind: DatasourceKind, config: Option<&Value>, f: F) -> Result<Option<Value>>
where
    F: FnMut(&str) -> Result<String>,
{
    match config {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(Value::Null)),
        Some(value) => BackendConfig::from_value(kind, value)?
            .map_secrets(f)?
            .into_value()
            .map(Some),
    }
}
