//! picshare CLI - picture-sharing API server
//!
//! - `serve`: run the HTTP API (image upload, fetch, like)
//! - `provision`: create the database and collections ahead of time

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "picshare",
    author,
    version,
    about = "Minimal picture-sharing backend",
    long_about = "Serve a small image API backed by PostgreSQL (or an in-memory store). \
                  Images are saved with a generated id and timestamp, fetched by id, and liked."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::ServeArgs),
    /// Create the database and collections if missing
    Provision(commands::ProvisionArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Provision(args) => commands::run_provision(args).await?,
    }
    Ok(())
}
