//! Tracehub CLI
//!
//! Command-line interface for managing and testing trace datasources.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tracehub")]
#[command(about = "CLI tool for Tracehub trace datasources")]
#[command(version)]
struct Cli {
    /// API server URL
    #[arg(
        long,
        env = "TRACEHUB_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage datasources of an organisation
    Datasources {
        /// Organisation id
        #[arg(long, env = "TRACEHUB_ORG")]
        org: Uuid,

        #[command(subcommand)]
        command: DatasourcesCommands,
    },

    /// Show API status
    Status,
}

#[derive(Subcommand)]
enum DatasourcesCommands {
    /// List datasources
    List,

    /// Show one datasource
    Get {
        /// Datasource id
        id: Uuid,
    },

    /// Create a datasource from a JSON file
    Create {
        /// Path to the datasource definition
        #[arg(long)]
        file: PathBuf,
    },

    /// Delete a datasource
    Delete {
        /// Datasource id
        id: Uuid,
    },

    /// Test connectivity of a saved datasource, or of an unsaved definition
    Test {
        /// Datasource id
        #[arg(conflicts_with = "file")]
        id: Option<Uuid>,

        /// Path to an unsaved datasource definition
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Datasources { org, command } => {
            commands::datasources::handle(&cli.api_url, org, command, cli.format).await?;
        }
        Commands::Status => {
            commands::status::handle(&cli.api_url, cli.format).await?;
        }
    }

    Ok(())
}
