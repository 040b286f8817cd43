//! HTTP server command
//!
//! Runs the picshare API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use picshare_db::{provider_from_config, BackendKind};
use picshare_server::{run_server, StatusMapping};

use crate::config::AppConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config; default: 127.0.0.1:3000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Path to a TOML config file (default: ~/.picshare/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Store backing the API (postgres or memory)
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Status codes for failures: uniform (always 500) or typed
    #[arg(long)]
    pub status_mapping: Option<StatusMapping>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(backend) = args.backend {
        config.db.backend = backend;
    }
    if let Some(url) = args.database_url {
        config.db.url = Some(url);
    }
    if let Some(mapping) = args.status_mapping {
        config.server.status_mapping = mapping;
    }

    if config.db.backend == BackendKind::Memory {
        tracing::warn!("Serving from the in-memory store; data is lost on exit");
    }

    let stores = provider_from_config(&config.db).context("Failed to set up the store")?;

    // Blocks until shutdown
    run_server(stores, config.server)
        .await
        .context("Server error")?;

    Ok(())
}
