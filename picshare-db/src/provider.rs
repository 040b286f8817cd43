//! Store selection
//!
//! The server holds one `StoreProvider` and opens a fresh session from it
//! for every request. Which backend sits behind the provider is decided
//! once, from configuration.

use std::sync::Arc;

use crate::backend::{Backend, MemoryBackend, PostgresBackend};
use crate::config::{BackendKind, DbConfig, SessionOptions};
use crate::error::Result;
use crate::session::{Db, ImageStore};

/// Source of store sessions
pub trait StoreProvider: Send + Sync {
    /// Open a new, disconnected session.
    fn open(&self) -> Box<dyn ImageStore>;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Provider handing out [`Db`] sessions over a shared backend
#[derive(Clone)]
pub struct DbProvider<B: Backend> {
    backend: B,
    options: SessionOptions,
}

impl<B: Backend> DbProvider<B> {
    pub fn new(backend: B, options: SessionOptions) -> Self {
        Self { backend, options }
    }

    /// Open a session with its concrete type.
    pub fn session(&self) -> Db<B> {
        Db::new(self.backend.clone(), self.options.clone())
    }
}

impl<B: Backend> StoreProvider for DbProvider<B> {
    fn open(&self) -> Box<dyn ImageStore> {
        Box::new(self.session())
    }

    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

/// Build the provider selected by `config.backend`.
pub fn provider_from_config(config: &DbConfig) -> Result<Arc<dyn StoreProvider>> {
    let options = config.session_options();
    let provider: Arc<dyn StoreProvider> = match config.backend {
        BackendKind::Postgres => Arc::new(DbProvider::new(
            PostgresBackend::connect_lazy(config)?,
            options,
        )),
        BackendKind::Memory => Arc::new(DbProvider::new(MemoryBackend::new(), options)),
    };

    tracing::info!(
        backend = provider.backend_name(),
        database = %config.database,
        "Store selected"
    );
    Ok(provider)
}
