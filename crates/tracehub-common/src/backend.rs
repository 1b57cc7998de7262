//! Typed view over the kind-dependent datasource config blob
//!
//! The stored `config` is opaque JSON. [`BackendConfig`] parses it into one
//! variant per [`DatasourceKind`] so every transform matches exhaustively on
//! the kind instead of probing nested optional properties. Fields the model
//! does not know about are carried in `extra` maps and survive the round trip.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::{non_empty, DatasourceKind};

/// Declared authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Basic,
    Bearer,
    Header,
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(AuthType::Basic),
            "bearer" => Ok(AuthType::Bearer),
            "header" => Ok(AuthType::Header),
            other => Err(Error::validation(format!(
                "Unsupported authentication type: {other}"
            ))),
        }
    }
}

/// Authentication block shared by every HTTP backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Bearer token (Tempo/Jaeger)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Bearer token or header value (Custom API)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Authentication {
    /// Parsed scheme; `None` when the type is missing or unknown
    pub fn scheme(&self) -> Option<AuthType> {
        self.auth_type.as_deref().and_then(|t| t.parse().ok())
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(self.username.as_deref())
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref())
    }

    /// Bearer credential, accepting either `token` or `value`
    pub fn bearer_token(&self) -> Option<&str> {
        non_empty(self.token.as_deref()).or_else(|| non_empty(self.value.as_deref()))
    }

    pub fn header_name(&self) -> Option<&str> {
        non_empty(self.header_name.as_deref())
    }

    pub fn header_value(&self) -> Option<&str> {
        non_empty(self.value.as_deref())
    }
}

/// Config for Tempo and Jaeger datasources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Config for ClickHouse datasources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickHouseBackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clickhouse: Option<ClickHouseSettings>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// ClickHouse connection settings as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickHouseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// `http` or `https`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ports arrive as numbers from API clients and as strings from some forms.
fn lenient_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(n)) => Ok(Some(n)),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Port::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {s}"))),
    }
}

/// Config for operator-defined Custom API datasources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomApiBackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_api: Option<CustomApiSettings>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Custom API settings as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilitySettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<EndpointSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_by_trace_id: Option<EndpointSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_names: Option<EndpointSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_values: Option<EndpointSetting>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EndpointSettings {
    pub fn search_path(&self) -> Option<&str> {
        path_of(self.search.as_ref())
    }

    pub fn search_by_trace_id_path(&self) -> Option<&str> {
        path_of(self.search_by_trace_id.as_ref())
    }

    pub fn attribute_names_path(&self) -> Option<&str> {
        path_of(self.attribute_names.as_ref())
    }

    pub fn attribute_values_path(&self) -> Option<&str> {
        path_of(self.attribute_values.as_ref())
    }
}

fn path_of(endpoint: Option<&EndpointSetting>) -> Option<&str> {
    endpoint.and_then(|e| non_empty(e.path.as_deref()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// HTTP method, `GET` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_by_query: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_by_attributes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by_attribute_exists: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_attribute_names: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_attribute_values: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Datasource config, one variant per backend kind
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Tempo(HttpBackendConfig),
    Jaeger(HttpBackendConfig),
    ClickHouse(ClickHouseBackendConfig),
    CustomApi(CustomApiBackendConfig),
}

impl BackendConfig {
    /// Parse the stored JSON for `kind`; `null` parses to an empty config.
    pub fn from_value(kind: DatasourceKind, value: &Value) -> Result<Self> {
        let value = if value.is_null() {
            Value::Object(Map::new())
        } else {
            value.clone()
        };
        let invalid =
            |e: serde_json::Error| Error::validation(format!("Invalid {kind} configuration: {e}"));

        Ok(match kind {
            DatasourceKind::Tempo => Self::Tempo(serde_json::from_value(value).map_err(invalid)?),
            DatasourceKind::Jaeger => Self::Jaeger(serde_json::from_value(value).map_err(invalid)?),
            DatasourceKind::ClickHouse => {
                Self::ClickHouse(serde_json::from_value(value).map_err(invalid)?)
            }
            DatasourceKind::CustomApi => {
                Self::CustomApi(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }

    pub fn kind(&self) -> DatasourceKind {
        match self {
            Self::Tempo(_) => DatasourceKind::Tempo,
            Self::Jaeger(_) => DatasourceKind::Jaeger,
            Self::ClickHouse(_) => DatasourceKind::ClickHouse,
            Self::CustomApi(_) => DatasourceKind::CustomApi,
        }
    }

    pub fn into_value(self) -> Result<Value> {
        let value = match self {
            Self::Tempo(c) | Self::Jaeger(c) => serde_json::to_value(c)?,
            Self::ClickHouse(c) => serde_json::to_value(c)?,
            Self::CustomApi(c) => serde_json::to_value(c)?,
        };
        Ok(value)
    }

    /// The authentication block outbound HTTP requests use, if any
    pub fn authentication(&self) -> Option<&Authentication> {
        match self {
            Self::Tempo(c) | Self::Jaeger(c) => c.authentication.as_ref(),
            Self::CustomApi(c) => c.custom_api.as_ref()?.authentication.as_ref(),
            Self::ClickHouse(_) => None,
        }
    }

    pub fn clickhouse(&self) -> Option<&ClickHouseSettings> {
        match self {
            Self::ClickHouse(c) => c.clickhouse.as_ref(),
            _ => None,
        }
    }

    pub fn custom_api(&self) -> Option<&CustomApiSettings> {
        match self {
            Self::CustomApi(c) => c.custom_api.as_ref(),
            _ => None,
        }
    }

    /// Rebuild the config with `f` applied to every sensitive field present.
    ///
    /// Sensitive fields are the ClickHouse password and the `password`,
    /// `token` and `value` of any authentication block.
    pub fn map_secrets<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<String>,
    {
        Ok(match self {
            Self::Tempo(mut c) => {
                c.authentication = map_auth(c.authentication, &mut f)?;
                Self::Tempo(c)
            }
            Self::Jaeger(mut c) => {
                c.authentication = map_auth(c.authentication, &mut f)?;
                Self::Jaeger(c)
            }
            Self::ClickHouse(mut c) => {
                if let Some(settings) = c.clickhouse.as_mut() {
                    settings.password = map_field(settings.password.take(), &mut f)?;
                }
                Self::ClickHouse(c)
            }
            Self::CustomApi(mut c) => {
                if let Some(settings) = c.custom_api.as_mut() {
                    settings.authentication = map_auth(settings.authentication.take(), &mut f)?;
                }
                Self::CustomApi(c)
            }
        })
    }
}

fn map_field<F>(field: Option<String>, f: &mut F) -> Result<Option<String>>
where
    F: FnMut(&str) -> Result<String>,
{
    match field {
        Some(value) if !value.is_empty() => f(&value).map(Some),
        other => Ok(other),
    }
}

/// Every credential field present is mapped regardless of the declared
/// type, so stale credentials left behind by a type change stay covered.
fn map_auth<F>(auth: Option<Authentication>, f: &mut F) -> Result<Option<Authentication>>
where
    F: FnMut(&str) -> Result<String>,
{
    let Some(mut auth) = auth else {
        return Ok(None);
    };
    auth.password = map_field(auth.password.take(), f)?;
    auth.token = map_field(auth.token.take(), f)?;
    auth.value = map_field(auth.value.take(), f)?;
    Ok(Some(auth))
}
