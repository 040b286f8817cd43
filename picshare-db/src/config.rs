//! Data layer configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default host of the backing store
pub const DEFAULT_HOST: &str = "localhost";

/// Default PostgreSQL port
pub const DEFAULT_PORT: u16 = 5432;

/// Default target database name
pub const DEFAULT_DATABASE: &str = "platzigram";

/// Default maximum connections for the pool.
/// Kept low; every request holds at most one.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

/// Which store backs a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Postgres,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown backend '{other}' (expected postgres or memory)")),
        }
    }
}

/// Data layer configuration (`[db]` table of the config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: BackendKind,

    /// Full connection string; takes precedence over host/port/user/password
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,

    /// Target database provisioned on connect
    pub database: String,

    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub operation_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            url: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            database: DEFAULT_DATABASE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

impl DbConfig {
    /// Per-session settings derived from this configuration.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            database: self.database.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            operation_timeout: Duration::from_millis(self.operation_timeout_ms),
        }
    }
}

/// Settings carried by every store session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Target database name
    pub database: String,
    /// Bound on acquiring a handle
    pub connect_timeout: Duration,
    /// Bound on each store round trip
    pub operation_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        DbConfig::default().session_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DbConfig::default();
        assert_eq!(config.backend, BackendKind::Postgres);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "platzigram");

        let options = config.session_options();
        assert_eq!(options.connect_timeout, Duration::from_secs(3));
        assert_eq!(options.operation_timeout, Duration::from_secs(5));
    }

    #[test]
    fn backend_kind_parses() {
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!("PostgreSQL".parse::<BackendKind>().unwrap(), BackendKind::Postgres);
        assert!("rethinkdb".parse::<BackendKind>().is_err());
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let config: DbConfig = serde_json::from_value(serde_json::json!({
            "backend": "memory",
            "database": "pics"
        }))
        .unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.database, "pics");
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
