//! Outbound authentication headers derived from datasource config

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::backend::{AuthType, Authentication, BackendConfig};
use crate::crypto::SecretCipher;
use crate::secrets::decrypt_config;
use crate::types::Datasource;

pub const AUTHORIZATION: &str = "Authorization";

/// Headers authenticating requests to the datasource's backend.
///
/// Incomplete or unknown authentication yields no headers; the remote end
/// then rejects the request and the connection test reports it.
pub fn build_auth_headers(cipher: &dyn SecretCipher, datasource: &Datasource) -> BTreeMap<String, String> {
    let decrypted = match decrypt_config(cipher, datasource.kind, datasource.config.as_ref()) {
        Ok(Some(config)) => config,
        Ok(None) => return BTreeMap::new(),
        Err(e) => {
            warn!(datasource_id = %datasource.id, error = %e, "Unable to decrypt datasource config");
            return BTreeMap::new();
        }
    };

    match BackendConfig::from_value(datasource.kind, &decrypted) {
        Ok(backend) => backend
            .authentication()
            .map(headers_for)
            .unwrap_or_default(),
        Err(e) => {
            warn!(datasource_id = %datasource.id, error = %e, "Unreadable datasource config");
            BTreeMap::new()
        }
    }
}

/// Headers for an already-decrypted authentication block
pub fn headers_for(auth: &Authentication) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    match auth.scheme() {
        Some(AuthType::Basic) => {
            if let (Some(username), Some(password)) = (auth.username(), auth.password()) {
                let credentials = STANDARD.encode(format!("{username}:{password}"));
                headers.insert(AUTHORIZATION.to_string(), format!("Basic {credentials}"));
            }
        }
        Some(AuthType::Bearer) => {
            if let Some(token) = auth.bearer_token() {
                headers.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
            }
        }
        Some(AuthType::Header) => {
            if let (Some(name), Some(value)) = (auth.header_name(), auth.header_value()) {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        None => {}
    }
    headers
}
