//! In-memory backend
//!
//! Shares one store between every clone, so sessions opened from the same
//! provider see each other's writes. Creates are no-ops when the target
//! already exists. Counts every primitive call; inserts can be refused,
//! `open` can be made to fail, and calls can be slowed down.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Backend, InsertOutcome};
use crate::error::{DbError, Result};
use crate::model::{with_id, Document};

type Table = BTreeMap<String, Document>;
type Database = BTreeMap<String, Table>;

/// Primitive call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub opens: usize,
    pub closes: usize,
    pub databases_created: usize,
    pub tables_created: usize,
    pub inserts: usize,
    pub reads: usize,
    pub updates: usize,
    /// Every primitive call, listings included
    pub total: usize,
}

#[derive(Default)]
struct MemoryState {
    databases: BTreeMap<String, Database>,
    stats: CallStats,
    refuse_inserts: Option<String>,
    unreachable: bool,
    latency: Option<Duration>,
}

impl MemoryState {
    fn table_mut(&mut self, db: &str, table: &str) -> Result<&mut Table> {
        self.databases
            .get_mut(db)
            .and_then(|d| d.get_mut(table))
            .ok_or_else(|| DbError::Transport(format!("table `{db}.{table}` does not exist")))
    }
}

/// Handle to the in-memory store
#[derive(Debug)]
pub struct MemoryHandle(());

/// In-memory backend
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the call counters.
    pub async fn stats(&self) -> CallStats {
        self.state.lock().await.stats
    }

    /// Make every insert report a store-side error with `detail`.
    /// `None` restores normal inserts.
    pub async fn refuse_inserts(&self, detail: Option<String>) {
        self.state.lock().await.refuse_inserts = detail;
    }

    /// Make `open` fail as if the store could not be reached.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().await.unreachable = unreachable;
    }

    /// Delay every primitive call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// Number of documents in a table, `None` if the table does not exist.
    pub async fn count(&self, db: &str, table: &str) -> Option<usize> {
        let state = self.state.lock().await;
        state
            .databases
            .get(db)
            .and_then(|d| d.get(table))
            .map(|t| t.len())
    }

    /// Lock the state after the configured latency has elapsed.
    async fn enter(&self) -> tokio::sync::MutexGuard<'_, MemoryState> {
        let latency = self.state.lock().await.latency;
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().await;
        state.stats.total += 1;
        state
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type Handle = MemoryHandle;

    async fn open(&self) -> Result<MemoryHandle> {
        let mut state = self.enter().await;
        if state.unreachable {
            return Err(DbError::Transport("memory store unreachable".into()));
        }
        state.stats.opens += 1;
        Ok(MemoryHandle(()))
    }

    async fn close(&self, _handle: MemoryHandle) -> Result<()> {
        let mut state = self.enter().await;
        state.stats.closes += 1;
        Ok(())
    }

    async fn list_databases(&self, _handle: &mut MemoryHandle) -> Result<Vec<String>> {
        let state = self.enter().await;
        Ok(state.databases.keys().cloned().collect())
    }

    async fn create_database(&self, _handle: &mut MemoryHandle, name: &str) -> Result<()> {
        let mut state = self.enter().await;
        if !state.databases.contains_key(name) {
            state.databases.insert(name.to_owned(), Database::new());
            state.stats.databases_created += 1;
        }
        Ok(())
    }

    async fn list_tables(&self, _handle: &mut MemoryHandle, db: &str) -> Result<Vec<String>> {
        let state = self.enter().await;
        state
            .databases
            .get(db)
            .map(|d| d.keys().cloned().collect())
            .ok_or_else(|| DbError::Transport(format!("database `{db}` does not exist")))
    }

    async fn create_table(&self, _handle: &mut MemoryHandle, db: &str, table: &str) -> Result<()> {
        let mut state = self.enter().await;
        let database = state
            .databases
            .get_mut(db)
            .ok_or_else(|| DbError::Transport(format!("database `{db}` does not exist")))?;
        if database.contains_key(table) {
            return Ok(());
        }
        database.insert(table.to_owned(), Table::new());
        state.stats.tables_created += 1;
        Ok(())
    }

    async fn insert(
        &self,
        _handle: &mut MemoryHandle,
        db: &str,
        table: &str,
        doc: Document,
    ) -> Result<InsertOutcome> {
        let mut state = self.enter().await;
        state.stats.inserts += 1;
        if let Some(detail) = state.refuse_inserts.clone() {
            return Ok(InsertOutcome::refused(detail));
        }

        let key = Uuid::new_v4().to_string();
        state
            .table_mut(db, table)?
            .insert(key.clone(), with_id(doc, key.clone()));
        Ok(InsertOutcome::inserted(key))
    }

    async fn get(
        &self,
        _handle: &mut MemoryHandle,
        db: &str,
        table: &str,
        id: &str,
    ) -> Result<Option<Document>> {
        let mut state = self.enter().await;
        state.stats.reads += 1;
        Ok(state.table_mut(db, table)?.get(id).cloned())
    }

    async fn increment(
        &self,
        _handle: &mut MemoryHandle,
        db: &str,
        table: &str,
        id: &str,
        field: &str,
    ) -> Result<Option<Document>> {
        let mut state = self.enter().await;
        state.stats.updates += 1;
        let Some(doc) = state.table_mut(db, table)?.get_mut(id) else {
            return Ok(None);
        };

        let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| DbError::overflow(id, field))?;
        doc.insert(field.to_owned(), Value::from(next));
        Ok(Some(doc.clone()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
