//! CLI subcommand handlers

pub mod datasources;
pub mod status;

use serde_json::Value;

/// Non-success response from the Tracehub API
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Decode a JSON response, turning error statuses into `CliError::Api`
pub async fn read_json(resp: reqwest::Response) -> anyhow::Result<Value> {
    let status = resp.status();
    if status.is_success() {
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        return Ok(resp.json::<Value>().await?);
    }

    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map_or_else(|| status.to_string(), str::to_string);
    Err(CliError::Api { status: status.as_u16(), message }.into())
}
