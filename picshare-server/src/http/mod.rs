//! HTTP layer
//!
//! Axum server with:
//! - Image routes (`GET /{id}`, `POST /`, `POST /{id}/like`)
//! - `{"error": ...}` bodies for every failure, 404 for unknown routes
//! - Request tracing
//! - Graceful shutdown

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, StatusMapping};
pub use server::{build_router, run_server, ServerConfig, ServerError};
