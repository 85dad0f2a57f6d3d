//! Command line interface
//!
//! - `serve`: run the HTTP API (default)
//! - `import`: replace the catalog from a JSON export

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use medlookup_core::import::read_catalog_file;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::create_router;
use crate::config::AppConfig;
use crate::logging::init_logging;

/// Medlookup - medicine information assistant
#[derive(Parser)]
#[command(name = "medlookup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Replace the catalog with the rows of a JSON array file
    Import {
        /// Path to the JSON export
        file: PathBuf,
    },
}

/// Load configuration and logging, then run the chosen command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Import { file } => import(&config, &file).await,
    }
}

async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = crate::create_app_state(config).await?;
    let app = create_router(state);

    let addr = build_socket_addr(config)?;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn import(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let batch = read_catalog_file(file)?;
    let store = crate::open_store(&config.database.path)?;

    let stored = store.replace_catalog(batch.records).await?;
    info!(
        stored,
        dropped = batch.dropped,
        duplicates = batch.duplicates,
        database = %config.database.path.display(),
        "Import complete"
    );
    Ok(())
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["medlookup"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["medlookup", "import", "medicines.json"]).unwrap();
        match cli.command {
            Some(Command::Import { file }) => assert_eq!(file, PathBuf::from("medicines.json")),
            _ => panic!("expected import"),
        }

        assert!(Cli::try_parse_from(["medlookup", "import"]).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig::default();
        assert_eq!(build_socket_addr(&config).unwrap().port(), 8080);
    }
}
