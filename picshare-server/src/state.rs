//! Application state shared across handlers

use std::sync::Arc;

use picshare_db::{ImageStore, StoreProvider};

use crate::http::error::StatusMapping;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    stores: Arc<dyn StoreProvider>,
    status_mapping: StatusMapping,
}

impl AppState {
    pub fn new(stores: Arc<dyn StoreProvider>, status_mapping: StatusMapping) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                stores,
                status_mapping,
            }),
        }
    }

    /// Open a fresh store session for one request.
    pub fn store(&self) -> Box<dyn ImageStore> {
        self.inner.stores.open()
    }

    pub fn status_mapping(&self) -> StatusMapping {
        self.inner.status_mapping
    }
}
