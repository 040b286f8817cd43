//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file: `--config <path>`, else `~/.picshare/config.toml` if present
//! 3. Environment (`.env` is loaded first): `DATABASE_URL`,
//!    `PICSHARE_BACKEND`, `PICSHARE_DATABASE`, `PICSHARE_BIND`
//! 4. Command-line flags (applied by each command)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use picshare_db::DbConfig;
use picshare_server::ServerConfig;
use serde::{Deserialize, Serialize};

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
}

impl AppConfig {
    /// Load configuration from file and environment.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Default config file path: ~/.picshare/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".picshare/config.toml")
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file (invalid TOML): {}", path.display()))
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.db.url = Some(url);
        }
        if let Some(backend) = lookup("PICSHARE_BACKEND") {
            self.db.backend = backend.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(database) = lookup("PICSHARE_DATABASE") {
            self.db.database = database;
        }
        if let Some(bind) = lookup("PICSHARE_BIND") {
            self.server.bind_addr = bind
                .parse()
                .with_context(|| format!("Invalid PICSHARE_BIND address: {bind}"))?;
        }
        Ok(())
    }
}
