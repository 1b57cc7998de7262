//! Canonical Custom API configuration derived from a stored datasource

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::backend::Authentication;
use crate::error::{Error, Result};
use crate::types::Datasource;

/// Normalized Custom API config; recomputed on every use
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBackendConfig {
    pub base_url: String,
    pub endpoints: CanonicalEndpoints,
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    pub headers: BTreeMap<String, String>,
}

impl CanonicalBackendConfig {
    /// Absolute URL of an endpoint path
    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        if endpoint.path.starts_with('/') || endpoint.path.is_empty() {
            format!("{}{}", self.base_url, endpoint.path)
        } else {
            format!("{}/{}", self.base_url, endpoint.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEndpoints {
    pub search: Endpoint,
    pub search_by_trace_id: Endpoint,
    pub attribute_names: Endpoint,
    pub attribute_values: Endpoint,
}

/// A remote operation: path (possibly with placeholders) and method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl Endpoint {
    /// Read an endpoint leniently; anything not shaped like
    /// `{ path: string, method: string }` falls back to an empty GET.
    fn from_value(setting: Option<&Value>) -> Self {
        let field = |key: &str| setting.and_then(|s| s.get(key)).and_then(Value::as_str);
        let method = match field("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => HttpMethod::Post,
            _ => HttpMethod::Get,
        };
        Self {
            path: field("path").unwrap_or_default().to_string(),
            method,
        }
    }
}

/// Optional operations the remote endpoint supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub search_by_query: bool,
    pub search_by_attributes: bool,
    pub filter_by_attribute_exists: bool,
    pub get_attribute_names: bool,
    pub get_attribute_values: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            search_by_query: true,
            search_by_attributes: false,
            filter_by_attribute_exists: false,
            get_attribute_names: false,
            get_attribute_values: false,
        }
    }
}

/// Map a Custom API datasource to its canonical config.
///
/// Only a missing `customApi` block is an error. Every other field is read
/// leniently: values of the wrong type fall back to their defaults and are
/// left for validation to reject.
pub fn map_custom_api(datasource: &Datasource) -> Result<CanonicalBackendConfig> {
    let settings = datasource
        .config
        .as_ref()
        .and_then(|c| c.get("customApi"))
        .filter(|s| !s.is_null())
        .ok_or_else(|| {
            Error::ConfigIntegrity(format!(
                "datasource {} has no customApi configuration",
                datasource.id
            ))
        })?;

    let base_url = settings
        .get("baseUrl")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .or_else(|| datasource.url())
        .unwrap_or_default();
    let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();

    let endpoint = |name: &str| {
        Endpoint::from_value(settings.get("endpoints").and_then(|e| e.get(name)))
    };

    let flag = |name: &str| {
        settings
            .get("capabilities")
            .and_then(|c| c.get(name))
            .and_then(lenient_bool)
    };
    let defaults = Capabilities::default();
    let capabilities = Capabilities {
        search_by_query: flag("searchByQuery").unwrap_or(defaults.search_by_query),
        search_by_attributes: flag("searchByAttributes").unwrap_or(defaults.search_by_attributes),
        filter_by_attribute_exists: flag("filterByAttributeExists")
            .unwrap_or(defaults.filter_by_attribute_exists),
        get_attribute_names: flag("getAttributeNames").unwrap_or(defaults.get_attribute_names),
        get_attribute_values: flag("getAttributeValues").unwrap_or(defaults.get_attribute_values),
    };

    let authentication = settings
        .get("authentication")
        .filter(|a| a.is_object())
        .and_then(|a| serde_json::from_value::<Authentication>(a.clone()).ok());

    let headers = settings
        .get("headers")
        .and_then(Value::as_object)
        .map(|headers| {
            headers
                .iter()
                .filter_map(|(name, value)| Some((name.clone(), header_value(value)?)))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    Ok(CanonicalBackendConfig {
        base_url,
        endpoints: CanonicalEndpoints {
            search: endpoint("search"),
            search_by_trace_id: endpoint("searchByTraceId"),
            attribute_names: endpoint("attributeNames"),
            attribute_values: endpoint("attributeValues"),
        },
        capabilities,
        authentication,
        headers,
    })
}

/// Booleans, also accepted as `"true"` / `"false"` strings
fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Scalar header values are stringified; nested values are dropped
fn header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
