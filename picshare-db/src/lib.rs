//! picshare-db: data access layer for picshare
//!
//! Manages the connection lifecycle against a document store, provisions
//! the schema on connect, and implements the image operations:
//!
//! - [`Db`]: connection manager and operations over any [`Backend`]
//! - [`provision`]: create-if-missing for the database and its collections
//! - [`StoreProvider`]: per-request sessions, backend chosen by [`DbConfig`]

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod provision;
pub mod session;

pub use backend::{Backend, CallStats, InsertOutcome, MemoryBackend, PostgresBackend};
pub use config::{BackendKind, DbConfig, SessionOptions};
pub use error::{DbError, Result};
pub use model::{Document, Image};
pub use provider::{provider_from_config, DbProvider, StoreProvider};
pub use provision::{ensure_schema, ProvisionReport};
pub use session::{Db, ImageStore};
