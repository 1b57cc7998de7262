//! Structural validation of datasource configuration
//!
//! Runs before persistence and stops at the first violation.

use serde_json::Value;

use crate::backend::{AuthType, Authentication, BackendConfig, ClickHouseBackendConfig, CustomApiBackendConfig};
use crate::error::{Error, Result};
use crate::types::{non_empty, DatasourceKind};

pub const TRACE_ID_PLACEHOLDER: &str = "{traceId}";
pub const ATTRIBUTE_NAME_PLACEHOLDER: &str = "{attributeName}";

/// Validate a datasource definition for its kind
pub fn validate_datasource(kind: DatasourceKind, url: Option<&str>, config: Option<&Value>) -> Result<()> {
    validate_url(kind, url)?;

    let backend = BackendConfig::from_value(kind, config.unwrap_or(&Value::Null))?;
    match &backend {
        BackendConfig::Tempo(c) | BackendConfig::Jaeger(c) => {
            if let Some(auth) = &c.authentication {
                validate_http_authentication(auth)?;
            }
            Ok(())
        }
        BackendConfig::ClickHouse(c) => validate_clickhouse(url, c),
        BackendConfig::CustomApi(c) => validate_custom_api(url, c),
    }
}

/// Tempo and Jaeger need a top-level URL
pub fn validate_url(kind: DatasourceKind, url: Option<&str>) -> Result<()> {
    if kind.requires_url() && non_empty(url).is_none() {
        return Err(Error::validation("URL is required for datasources"));
    }
    Ok(())
}

pub fn validate_clickhouse(url: Option<&str>, config: &ClickHouseBackendConfig) -> Result<()> {
    let Some(settings) = &config.clickhouse else {
        if non_empty(url).is_none() {
            return Err(Error::validation(
                "ClickHouse datasource requires either url or config.clickhouse",
            ));
        }
        return Ok(());
    };

    let present = |v: &Option<String>| non_empty(v.as_deref()).is_some();
    if !(present(&settings.host) && present(&settings.database) && present(&settings.table_name)) {
        return Err(Error::validation(
            "ClickHouse configuration requires host, database, and tableName",
        ));
    }
    Ok(())
}

pub fn validate_custom_api(url: Option<&str>, config: &CustomApiBackendConfig) -> Result<()> {
    let Some(settings) = &config.custom_api else {
        return Ok(());
    };

    if non_empty(settings.base_url.as_deref()).is_none() && non_empty(url).is_none() {
        return Err(Error::validation(
            "Custom API datasource requires either url or config.customApi.baseUrl",
        ));
    }

    let endpoints = settings.endpoints.clone().unwrap_or_default();
    if endpoints.search_path().is_none() {
        return Err(Error::validation("Custom API endpoints.search.path is required"));
    }

    if !endpoints
        .search_by_trace_id_path()
        .is_some_and(|p| p.contains(TRACE_ID_PLACEHOLDER))
    {
        return Err(Error::validation(
            "Custom API endpoints.searchByTraceId.path is required and must contain {traceId}",
        ));
    }

    let capabilities = settings.capabilities.clone().unwrap_or_default();
    if capabilities.get_attribute_names == Some(true) && endpoints.attribute_names_path().is_none() {
        return Err(Error::validation(
            "Custom API endpoints.attributeNames.path is required when getAttributeNames is enabled",
        ));
    }

    if capabilities.get_attribute_values == Some(true)
        && !endpoints
            .attribute_values_path()
            .is_some_and(|p| p.contains(ATTRIBUTE_NAME_PLACEHOLDER))
    {
        return Err(Error::validation(
            "Custom API endpoints.attributeValues.path is required and must contain {attributeName} when getAttributeValues is enabled",
        ));
    }

    if let Some(auth) = &settings.authentication {
        validate_custom_api_authentication(auth)?;
    }
    Ok(())
}

/// Tempo/Jaeger accept basic and bearer only
pub fn validate_http_authentication(auth: &Authentication) -> Result<()> {
    match parse_scheme(auth)? {
        AuthType::Basic => require_basic(auth),
        AuthType::Bearer => require_bearer(auth),
        AuthType::Header => Err(Error::validation("Unsupported authentication type: header")),
    }
}

pub fn validate_custom_api_authentication(auth: &Authentication) -> Result<()> {
    match parse_scheme(auth)? {
        AuthType::Basic => require_basic(auth),
        AuthType::Bearer => require_bearer(auth),
        AuthType::Header => {
            if auth.header_name().is_none() || auth.header_value().is_none() {
                return Err(Error::validation(
                    "Header authentication requires headerName and value",
                ));
            }
            Ok(())
        }
    }
}

fn parse_scheme(auth: &Authentication) -> Result<AuthType> {
    auth.auth_type.as_deref().unwrap_or_default().parse()
}

fn require_basic(auth: &Authentication) -> Result<()> {
    if auth.username().is_none() || auth.password().is_none() {
        return Err(Error::validation(
            "Basic authentication requires username and password",
        ));
    }
    Ok(())
}

fn require_bearer(auth: &Authentication) -> Result<()> {
    if auth.bearer_token().is_none() {
        return Err(Error::validation("Bearer authentication requires a token"));
    }
    Ok(())
}
