//! Datasource commands

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{DatasourcesCommands, OutputFormat};

use super::read_json;

pub async fn handle(
    api_url: &str,
    org: Uuid,
    command: DatasourcesCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let base = format!("{api_url}/v1/organisations/{org}/datasources");

    match command {
        DatasourcesCommands::List => {
            let resp = read_json(client.get(&base).send().await?).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                OutputFormat::Table => print_table(resp.as_array().map_or(&[][..], Vec::as_slice)),
            }
        }

        DatasourcesCommands::Get { id } => {
            let resp = read_json(client.get(format!("{base}/{id}")).send().await?).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                OutputFormat::Table => print_detail(&resp)?,
            }
        }

        DatasourcesCommands::Create { file } => {
            let body = read_body(&file)?;
            debug!(file = %file.display(), "Creating datasource");
            let resp = read_json(client.post(&base).json(&body).send().await?).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                OutputFormat::Table => {
                    println!("Created datasource {}", field(&resp, "id"));
                }
            }
        }

        DatasourcesCommands::Delete { id } => {
            read_json(client.delete(format!("{base}/{id}")).send().await?).await?;
            println!("Deleted datasource {id}");
        }

        DatasourcesCommands::Test { id, file } => {
            let request = match (id, file) {
                (Some(id), _) => client.post(format!("{base}/{id}/test")),
                (None, Some(file)) => client
                    .post(format!("{api_url}/v1/datasources/test"))
                    .json(&read_body(&file)?),
                (None, None) => anyhow::bail!("either a datasource id or --file is required"),
            };
            let resp = read_json(request.send().await?).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
                OutputFormat::Table => println!("{}", test_summary(&resp)),
            }
        }
    }

    Ok(())
}

fn read_body(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("-")
}

fn short_time(raw: &str) -> String {
    raw.parse::<DateTime<Utc>>()
        .map_or_else(|_| raw.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn test_summary(resp: &Value) -> String {
    let success = resp.get("success").and_then(Value::as_bool).unwrap_or(false);
    let message = field(resp, "message");
    if success {
        format!("OK    {message}")
    } else {
        format!("FAIL  {message}")
    }
}

fn print_table(datasources: &[Value]) {
    println!("{:<38} {:<12} {:<24} {:<18} URL", "ID", "TYPE", "NAME", "CREATED");
    println!("{}", "-".repeat(110));
    for ds in datasources {
        println!(
            "{:<38} {:<12} {:<24} {:<18} {}",
            field(ds, "id"),
            field(ds, "type"),
            field(ds, "name"),
            short_time(field(ds, "createdAt")),
            field(ds, "url"),
        );
    }
}

fn print_detail(ds: &Value) -> anyhow::Result<()> {
    println!("ID:          {}", field(ds, "id"));
    println!("Name:        {}", field(ds, "name"));
    println!("Type:        {}", field(ds, "type"));
    println!("Description: {}", field(ds, "description"));
    println!("URL:         {}", field(ds, "url"));
    println!("Created:     {}", short_time(field(ds, "createdAt")));
    println!("Updated:     {}", short_time(field(ds, "updatedAt")));
    if let Some(config) = ds.get("config").filter(|c| !c.is_null()) {
        println!("Config:\n{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}
