//! ClickHouse client wrapper used for datasource connection tests

use std::time::Duration;

use clickhouse::Client;
use tracing::{debug, instrument};

use crate::{
    backend::ClickHouseSettings,
    error::{Error, Result},
    types::non_empty,
};

pub const DEFAULT_PORT: u16 = 8123;
pub const DEFAULT_USERNAME: &str = "default";
pub const DEFAULT_PROTOCOL: &str = "http";

pub const MISSING_HOST_OR_DATABASE: &str =
    "ClickHouse configuration missing: host and database are required";

/// Resolved connection parameters for one datasource
#[derive(Clone, PartialEq, Eq)]
pub struct ClickHouseConnection {
    pub url: String,
    pub database: String,
    pub username: String,
    password: String,
}

impl std::fmt::Debug for ClickHouseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseConnection")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ClickHouseConnection {
    /// Apply defaults to decrypted settings; host and database are mandatory
    pub fn from_settings(settings: &ClickHouseSettings) -> Result<Self> {
        let (Some(host), Some(database)) = (
            non_empty(settings.host.as_deref()),
            non_empty(settings.database.as_deref()),
        ) else {
            return Err(Error::ClickHouseConnection(MISSING_HOST_OR_DATABASE.to_string()));
        };

        let protocol = non_empty(settings.protocol.as_deref()).unwrap_or(DEFAULT_PROTOCOL);
        let port = settings.port.unwrap_or(DEFAULT_PORT);

        Ok(Self {
            url: format!("{protocol}://{host}:{port}"),
            database: database.to_string(),
            username: non_empty(settings.username.as_deref())
                .unwrap_or(DEFAULT_USERNAME)
                .to_string(),
            password: settings.password.clone().unwrap_or_default(),
        })
    }
}

/// Short-lived ClickHouse client; built per call, never pooled
pub struct ClickHouseClient {
    client: Client,
    timeout: Duration,
}

impl ClickHouseClient {
    /// Create a new ClickHouse client from resolved connection parameters
    pub fn new(connection: &ClickHouseConnection, timeout: Duration) -> Self {
        let client = Client::default()
            .with_url(&connection.url)
            .with_database(&connection.database)
            .with_user(&connection.username)
            .with_password(&connection.password);

        Self { client, timeout }
    }

    /// Run `SELECT 1` within the configured timeout
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<()> {
        let query = self.client.query("SELECT 1").fetch_one::<u8>();
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(_)) => {
                debug!("ClickHouse answered SELECT 1");
                Ok(())
            }
            Ok(Err(clickhouse::error::Error::Network(e))) => {
                Err(Error::ClickHouseConnection(e.to_string()))
            }
            Ok(Err(e)) => Err(Error::ClickHouseQuery(e.to_string())),
            Err(_) => Err(Error::ClickHouseConnection(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
