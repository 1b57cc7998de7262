//! Status command

use crate::OutputFormat;

use super::read_json;

pub async fn handle(api_url: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let resp = read_json(client.get(format!("{api_url}/health")).send().await?).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        OutputFormat::Table => {
            println!("Tracehub API Status");
            println!("===================\n");

            let status = resp.get("status").and_then(|s| s.as_str()).unwrap_or("unknown");
            let version = resp.get("version").and_then(|v| v.as_str()).unwrap_or("unknown");
            println!("API:     {api_url}");
            println!("Status:  {status}");
            println!("Version: {version}");
        }
    }

    Ok(())
}
