//! Error types for Tracehub

use thiserror::Error;

/// Result type alias using Tracehub Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tracehub error types
#[derive(Error, Debug)]
pub enum Error {
    /// Datasource input rejected before persistence
    #[error("{0}")]
    Validation(String),

    /// Stored configuration does not have the shape its kind requires
    #[error("Datasource configuration integrity error: {0}")]
    ConfigIntegrity(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("{0}")]
    Normalization(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Trace not found: {0}")]
    TraceNotFound(String),

    #[error("ClickHouse connection error: {0}")]
    ClickHouseConnection(String),

    #[error("ClickHouse query error: {0}")]
    ClickHouseQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::TraceNotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::ClickHouseConnection(_))
    }
}
