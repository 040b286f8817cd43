//! Schema provisioning
//!
//! Creates the target database and the collections the data layer needs,
//! skipping whatever already exists. Runs on every connect; after the first
//! successful run it only lists and never creates.

use std::time::Duration;

use crate::backend::Backend;
use crate::error::Result;
use crate::session::bounded;

/// Collection holding image records
pub const IMAGES: &str = "images";

/// Collection holding user records
pub const USERS: &str = "users";

/// Collections that must exist in the target database
pub const REQUIRED_TABLES: [&str; 2] = [IMAGES, USERS];

/// What a provisioning run created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created_database: bool,
    pub created_tables: Vec<String>,
}

impl ProvisionReport {
    /// True when the run created nothing.
    pub fn is_noop(&self) -> bool {
        !self.created_database && self.created_tables.is_empty()
    }
}

/// Ensure `database` and every required table exist.
///
/// Steps run strictly in order, one round trip each, every one bounded by
/// `timeout`.
pub async fn ensure_schema<B: Backend>(
    backend: &B,
    handle: &mut B::Handle,
    database: &str,
    timeout: Duration,
) -> Result<ProvisionReport> {
    let mut report = ProvisionReport::default();

    let databases = bounded("list databases", timeout, backend.list_databases(handle)).await?;
    if !databases.iter().any(|d| d == database) {
        bounded("create database", timeout, backend.create_database(handle, database)).await?;
        report.created_database = true;
    }

    let tables = bounded("list tables", timeout, backend.list_tables(handle, database)).await?;
    for table in REQUIRED_TABLES {
        if !tables.iter().any(|t| t == table) {
            bounded("create table", timeout, backend.create_table(handle, database, table)).await?;
            report.created_tables.push(table.to_owned());
        }
    }

    if !report.is_noop() {
        tracing::info!(
            backend = backend.name(),
            database,
            created_database = report.created_database,
            created_tables = ?report.created_tables,
            "Provisioned schema"
        );
    }

    Ok(report)
}
