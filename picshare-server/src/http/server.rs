//! Axum server setup
//!
//! Server skeleton with:
//! - Tracing middleware
//! - Route-not-found fallback
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use picshare_db::StoreProvider;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::error::StatusMapping;
use super::routes;
use crate::state::AppState;

/// Server configuration (`[server]` table of the config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,

    /// How handler failures map to status codes (default: uniform 500)
    pub status_mapping: StatusMapping,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            status_mapping: StatusMapping::default(),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::images::router())
        .fallback(routes::images::route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let stores = provider_from_config(&db_config)?;
/// run_server(stores, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    stores: Arc<dyn StoreProvider>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    tracing::info!(
        backend = stores.backend_name(),
        status_mapping = ?config.status_mapping,
        "Store provider ready"
    );
    let app = build_router(AppState::new(stores, config.status_mapping));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.status_mapping, StatusMapping::Uniform);
    }

    #[test]
    fn config_table_fills_in_defaults() {
        let config: ServerConfig =
            serde_json::from_value(serde_json::json!({ "status_mapping": "typed" })).unwrap();
        assert_eq!(config.status_mapping, StatusMapping::Typed);
        assert_eq!(config.bind_addr, ServerConfig::default().bind_addr);
    }
}
