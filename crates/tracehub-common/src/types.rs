//! Core types for Tracehub
//!
//! A datasource is an organisation-scoped pointer at one trace backend.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trace backend a datasource talks to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasourceKind {
    Tempo,
    Jaeger,
    #[serde(rename = "clickhouse")]
    ClickHouse,
    CustomApi,
}

impl DatasourceKind {
    /// Whether the top-level `url` is mandatory for this kind
    pub fn requires_url(self) -> bool {
        matches!(self, DatasourceKind::Tempo | DatasourceKind::Jaeger)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatasourceKind::Tempo => "tempo",
            DatasourceKind::Jaeger => "jaeger",
            DatasourceKind::ClickHouse => "clickhouse",
            DatasourceKind::CustomApi => "custom_api",
        }
    }
}

impl std::fmt::Display for DatasourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a kind string names no supported backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedKind(pub String);

impl std::fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unsupported datasource type: {}", self.0)
    }
}

impl std::error::Error for UnsupportedKind {}

impl FromStr for DatasourceKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tempo" => Ok(DatasourceKind::Tempo),
            "jaeger" => Ok(DatasourceKind::Jaeger),
            "clickhouse" => Ok(DatasourceKind::ClickHouse),
            "custom_api" => Ok(DatasourceKind::CustomApi),
            other => Err(UnsupportedKind(other.to_string())),
        }
    }
}

/// A stored datasource record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    pub id: Uuid,

    /// Owning organisation; every lookup is scoped by it
    pub organisation_id: Uuid,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub kind: DatasourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Kind-dependent JSON blob; sensitive fields are encrypted at rest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Datasource {
    /// Top-level URL, treating an empty string as absent
    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }
}

/// Input accepted when creating a datasource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDatasource {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub kind: DatasourceKind,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourcePatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    /// Deep-merged into the stored config
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Outcome of a single connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityResult {
    pub success: bool,
    pub message: String,
}

impl ConnectivityResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: "Connection successful".to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn unsupported() -> Self {
        Self::failure("Unsupported datasource type")
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
