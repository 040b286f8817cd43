//! picshare-server: HTTP dispatcher for picshare
//!
//! Maps method + path to the image operations of `picshare-db`, running
//! each one inside its own connect/disconnect bracket.

pub mod http;
pub mod state;

pub use http::{build_router, run_server, ApiError, ServerConfig, ServerError, StatusMapping};
pub use state::AppState;
