//! Backing store abstraction
//!
//! A backend exposes the raw document-store primitives the data layer is
//! built from. It knows nothing about images, sessions or provisioning
//! order; `Db` drives it.
//!
//! - `postgres`: JSONB documents in PostgreSQL, handles checked out of a pool
//! - `memory`: process-local store used for tests and demo deployments

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Document;

pub use memory::{CallStats, MemoryBackend};
pub use postgres::PostgresBackend;

/// Result of an insert, as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Keys generated for the inserted documents, in insertion order
    pub generated_keys: Vec<String>,
    /// Number of documents the store refused
    pub errors: usize,
    /// Detail of the first refusal, if any
    pub first_error: Option<String>,
}

impl InsertOutcome {
    /// Outcome of a single successful insert.
    pub fn inserted(key: impl Into<String>) -> Self {
        Self {
            generated_keys: vec![key.into()],
            ..Self::default()
        }
    }

    /// Outcome of a single refused insert.
    pub fn refused(detail: impl Into<String>) -> Self {
        Self {
            generated_keys: Vec::new(),
            errors: 1,
            first_error: Some(detail.into()),
        }
    }
}

/// Document-store primitives.
///
/// Every method is one round trip against the store. Handles are owned by
/// the caller between `open` and `close`.
#[async_trait]
pub trait Backend: Clone + Send + Sync + 'static {
    /// Live connection to the store
    type Handle: Send + 'static;

    /// Establish a handle.
    async fn open(&self) -> Result<Self::Handle>;

    /// Release a handle.
    async fn close(&self, handle: Self::Handle) -> Result<()>;

    async fn list_databases(&self, handle: &mut Self::Handle) -> Result<Vec<String>>;

    async fn create_database(&self, handle: &mut Self::Handle, name: &str) -> Result<()>;

    async fn list_tables(&self, handle: &mut Self::Handle, db: &str) -> Result<Vec<String>>;

    async fn create_table(&self, handle: &mut Self::Handle, db: &str, table: &str) -> Result<()>;

    /// Insert one document. Store-side refusals are reported in the outcome,
    /// not as `Err`.
    async fn insert(
        &self,
        handle: &mut Self::Handle,
        db: &str,
        table: &str,
        doc: Document,
    ) -> Result<InsertOutcome>;

    /// Fetch a document by key, with its `id` field populated.
    async fn get(
        &self,
        handle: &mut Self::Handle,
        db: &str,
        table: &str,
        id: &str,
    ) -> Result<Option<Document>>;

    /// Atomically add one to an integer field (missing counts as 0) and
    /// return the updated document. `None` if the key does not exist.
    async fn increment(
        &self,
        handle: &mut Self::Handle,
        db: &str,
        table: &str,
        id: &str,
        field: &str,
    ) -> Result<Option<Document>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
