//! Tracehub Common Library
//!
//! Datasource model, credential handling, connectivity testing and trace
//! normalization shared by the Tracehub API and CLI.

pub mod auth;
pub mod backend;
pub mod clickhouse;
pub mod config;
pub mod connectivity;
pub mod crypto;
pub mod error;
pub mod mapper;
pub mod normalize;
pub mod secrets;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod crypto_test;
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod secrets_test;
#[cfg(test)]
mod store_test;
#[cfg(test)]
mod types_test;
#[cfg(test)]
mod validation_test;

pub use config::Config;
pub use crypto::{ChaChaCipher, SecretCipher};
pub use error::{Error, Result};
pub use service::DatasourceService;
pub use types::{
    ConnectivityResult, Datasource, DatasourceKind, DatasourcePatch, NewDatasource, UnsupportedKind,
};
