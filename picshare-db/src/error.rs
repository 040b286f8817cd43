//! Error types for picshare-db

use thiserror::Error;

/// Result type alias for data access operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Data access error type
#[derive(Error, Debug)]
pub enum DbError {
    /// Operation invoked on a session without an active connection
    #[error("not connected")]
    NotConnected,

    /// Backend unreachable, or the connection failed mid-operation
    #[error("transport error: {0}")]
    Transport(String),

    /// Store-reported write failure on insert
    #[error("{0}")]
    Insert(String),

    /// Requested id does not exist
    #[error("image {id} not found")]
    NotFound { id: String },

    /// Counter increment would exceed the integer range
    #[error("{field} of image {id} cannot be incremented further")]
    Overflow { id: String, field: String },

    /// A bounded step did not finish in time
    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },

    /// Stored document could not be decoded as an image
    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),
}

impl DbError {
    /// Create a transport error from any displayable cause
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Create a not-found error for an image id
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

impl DbError {
    /// Create an overflow error for a counter field
    pub fn overflow(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Overflow {
            id: id.into(),
            field: field.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
