//! Schema provisioning command
//!
//! Opens one session, connects (which creates anything missing) and
//! disconnects again.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use picshare_db::provider_from_config;

use crate::config::AppConfig;

/// Arguments for the provision command
#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Path to a TOML config file (default: ~/.picshare/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Provision the configured store
pub async fn run_provision(args: ProvisionArgs) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        config.db.url = Some(url);
    }

    let stores = provider_from_config(&config.db).context("Failed to set up the store")?;
    let mut store = stores.open();
    let report = store
        .connect()
        .await
        .context("Failed to connect")?;
    store
        .disconnect()
        .await
        .context("Failed to disconnect")?;

    if report.is_noop() {
        println!("Schema for '{}' already provisioned", config.db.database);
    } else {
        if report.created_database {
            println!("Created database '{}'", config.db.database);
        }
        for table in &report.created_tables {
            println!("Created table '{}.{}'", config.db.database, table);
        }
    }

    Ok(())
}
