//! Connection tests against a datasource's backend
//!
//! One best-effort probe per call, no retries. Every failure is classified
//! into a [`ConnectivityResult`]; nothing is returned as an error.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::{
    auth::{build_auth_headers, headers_for},
    backend::BackendConfig,
    clickhouse::{ClickHouseClient, ClickHouseConnection, MISSING_HOST_OR_DATABASE},
    config::ConnectivityConfig,
    crypto::SecretCipher,
    error::Error,
    mapper::{map_custom_api, HttpMethod},
    secrets::decrypt_config,
    types::{ConnectivityResult, Datasource, DatasourceKind},
};

pub const MSG_AUTH_FAILED: &str = "Authentication failed";
pub const MSG_UNREACHABLE: &str = "Unable to connect to datasource URL";
pub const MSG_NOT_FOUND: &str = "Endpoint not found - check URL and path configuration";
pub const MSG_GENERIC: &str = "Connection test failed";
pub const MSG_URL_MISSING: &str = "Datasource URL not configured";
pub const MSG_BASE_URL_MISSING: &str = "Custom API baseUrl not configured";
pub const MSG_CLICKHOUSE_UNREACHABLE: &str = "Unable to connect to ClickHouse server";
pub const MSG_CLICKHOUSE_AUTH: &str = "Authentication failed - check username and password";

const TEMPO_PROBE_PATH: &str = "/api/search";
const JAEGER_PROBE_PATH: &str = "/api/v3/services";

/// Runs connection tests for stored or unsaved datasources
#[derive(Clone)]
pub struct ConnectivityTester {
    cipher: Arc<dyn SecretCipher>,
    config: ConnectivityConfig,
}

impl ConnectivityTester {
    pub fn new(cipher: Arc<dyn SecretCipher>, config: ConnectivityConfig) -> Self {
        Self { cipher, config }
    }

    /// Probe the datasource's backend once and classify the outcome
    #[instrument(skip(self, datasource), fields(datasource_id = %datasource.id, kind = %datasource.kind))]
    pub async fn test_connection(&self, datasource: &Datasource) -> ConnectivityResult {
        let result = match datasource.kind {
            DatasourceKind::Tempo => self.test_http(datasource, TEMPO_PROBE_PATH).await,
            DatasourceKind::Jaeger => self.test_http(datasource, JAEGER_PROBE_PATH).await,
            DatasourceKind::ClickHouse => self.test_clickhouse(datasource).await,
            DatasourceKind::CustomApi => self.test_custom_api(datasource).await,
        };

        if result.success {
            debug!("Connection test succeeded");
        } else {
            warn!(message = %result.message, "Connection test failed");
        }
        result
    }

    async fn test_http(&self, datasource: &Datasource, probe_path: &str) -> ConnectivityResult {
        let Some(url) = datasource.url() else {
            return ConnectivityResult::failure(MSG_URL_MISSING);
        };
        let headers = build_auth_headers(self.cipher.as_ref(), datasource);
        let endpoint = format!("{}{probe_path}", url.trim_end_matches('/'));

        match self.http_client() {
            Ok(client) => {
                let request = with_headers(client.get(endpoint), &headers);
                classify_http(request.send().await)
            }
            Err(e) => ConnectivityResult::failure(e.to_string()),
        }
    }

    async fn test_clickhouse(&self, datasource: &Datasource) -> ConnectivityResult {
        let settings = match self.decrypted(datasource) {
            Ok(backend) => backend.clickhouse().cloned().unwrap_or_default(),
            Err(e) => return ConnectivityResult::failure(e.to_string()),
        };

        let connection = match ClickHouseConnection::from_settings(&settings) {
            Ok(connection) => connection,
            Err(_) => return ConnectivityResult::failure(MISSING_HOST_OR_DATABASE),
        };

        let client = ClickHouseClient::new(&connection, self.config.clickhouse_timeout());
        match client.ping().await {
            Ok(()) => ConnectivityResult::ok(),
            Err(e) => classify_clickhouse(&e),
        }
    }

    async fn test_custom_api(&self, datasource: &Datasource) -> ConnectivityResult {
        let decrypted = match decrypt_config(self.cipher.as_ref(), datasource.kind, datasource.config.as_ref()) {
            Ok(config) => Datasource {
                config,
                ..datasource.clone()
            },
            Err(e) => return ConnectivityResult::failure(e.to_string()),
        };

        let canonical = match map_custom_api(&decrypted) {
            Ok(canonical) => canonical,
            Err(e) => return ConnectivityResult::failure(e.to_string()),
        };
        if canonical.base_url.is_empty() {
            return ConnectivityResult::failure(MSG_BASE_URL_MISSING);
        }

        let mut headers = canonical
            .authentication
            .as_ref()
            .map(headers_for)
            .unwrap_or_default();
        headers.extend(canonical.headers.clone());

        let end = Utc::now();
        let start = end - ChronoDuration::hours(self.config.probe_lookback_hours);
        let window = [
            ("start", start.timestamp()),
            ("end", end.timestamp()),
            ("limit", 1),
        ];

        let endpoint = &canonical.endpoints.search;
        let url = canonical.url_for(endpoint);
        let client = match self.http_client() {
            Ok(client) => client,
            Err(e) => return ConnectivityResult::failure(e.to_string()),
        };
        let request = match endpoint.method {
            HttpMethod::Get => client.get(url).query(&window),
            HttpMethod::Post => {
                let body: BTreeMap<&str, i64> = window.into_iter().collect();
                client.post(url).json(&body)
            }
        };

        classify_http(with_headers(request, &headers).send().await)
    }

    fn decrypted(&self, datasource: &Datasource) -> crate::Result<BackendConfig> {
        let config = decrypt_config(self.cipher.as_ref(), datasource.kind, datasource.config.as_ref())?;
        BackendConfig::from_value(datasource.kind, config.as_ref().unwrap_or(&serde_json::Value::Null))
    }

    fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        http_client(self.config.http_timeout())
    }
}

fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: &BTreeMap<String, String>,
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    request
}

/// Map an HTTP probe outcome to a connectivity result
pub fn classify_http(outcome: reqwest::Result<reqwest::Response>) -> ConnectivityResult {
    let response = match outcome {
        Ok(response) => response,
        Err(e) if e.is_connect() || e.is_timeout() => {
            return ConnectivityResult::failure(MSG_UNREACHABLE)
        }
        Err(e) => return ConnectivityResult::failure(error_message(&e.to_string())),
    };

    let status = response.status();
    if status.is_success() {
        return ConnectivityResult::ok();
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ConnectivityResult::failure(MSG_AUTH_FAILED)
        }
        StatusCode::NOT_FOUND => ConnectivityResult::failure(MSG_NOT_FOUND),
        _ => match response.error_for_status() {
            Err(e) => ConnectivityResult::failure(error_message(&e.to_string())),
            Ok(_) => ConnectivityResult::failure(format!("{MSG_GENERIC}: HTTP {status}")),
        },
    }
}

/// Map a ClickHouse probe error to a connectivity result
pub fn classify_clickhouse(error: &Error) -> ConnectivityResult {
    let message = match error {
        Error::ClickHouseConnection(m) | Error::ClickHouseQuery(m) => m.as_str(),
        _ => return ConnectivityResult::failure(error_message(&error.to_string())),
    };

    if error.is_connection_error() || is_transport_failure(message) {
        ConnectivityResult::failure(MSG_CLICKHOUSE_UNREACHABLE)
    } else if message.contains("Authentication") || message.contains("password") {
        ConnectivityResult::failure(MSG_CLICKHOUSE_AUTH)
    } else {
        ConnectivityResult::failure(error_message(message))
    }
}

fn is_transport_failure(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["connection refused", "econnrefused", "timed out", "etimedout"]
        .iter()
        .any(|needle| lower.contains(needle))
}

fn error_message(message: &str) -> String {
    if message.trim().is_empty() {
        MSG_GENERIC.to_string()
    } else {
        message.to_string()
    }
}
