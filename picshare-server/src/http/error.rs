//! API error type with IntoResponse
//!
//! Every failure becomes `{"error": <message>}`. The status code depends on
//! the configured [`StatusMapping`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use picshare_db::DbError;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Message returned when no route matches
pub const ROUTE_NOT_FOUND: &str = "route not found";

/// How handler failures map to status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMapping {
    /// Every handler failure is a 500
    #[default]
    Uniform,
    /// Status follows the failure kind
    Typed,
}

impl StatusMapping {
    /// Status for a data layer failure.
    pub fn for_store(&self, err: &DbError) -> StatusCode {
        match self {
            Self::Uniform => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Typed => match err {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::NotConnected | DbError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
                DbError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                DbError::Overflow { .. } => StatusCode::CONFLICT,
                DbError::Insert(_) | DbError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Status for a request body that is not a JSON object.
    pub fn for_invalid_body(&self) -> StatusCode {
        match self {
            Self::Uniform => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Typed => StatusCode::BAD_REQUEST,
        }
    }
}

impl std::str::FromStr for StatusMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "typed" => Ok(Self::Typed),
            other => Err(format!("unknown status mapping '{other}' (expected uniform or typed)")),
        }
    }
}

/// API error: status plus message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// No route matched the method and path.
    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
    }

    pub fn from_store(err: DbError, mapping: StatusMapping) -> Self {
        Self::new(mapping.for_store(&err), err.to_string())
    }

    pub fn invalid_body(reason: impl std::fmt::Display, mapping: StatusMapping) -> Self {
        Self::new(mapping.for_invalid_body(), format!("invalid request body: {reason}"))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "Request failed: {}", self.message);
        } else {
            tracing::debug!(status = self.status.as_u16(), "Request rejected: {}", self.message);
        }

        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn uniform_mapping_is_always_500() {
        let mapping = StatusMapping::Uniform;
        for err in [
            DbError::NotConnected,
            DbError::not_found("x"),
            DbError::Insert("boom".into()),
            DbError::Transport("down".into()),
            DbError::overflow("x", "likes"),
        ] {
            assert_eq!(mapping.for_store(&err), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(mapping.for_invalid_body(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn typed_mapping_follows_kind() {
        let mapping = StatusMapping::Typed;
        assert_eq!(mapping.for_store(&DbError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(mapping.for_store(&DbError::NotConnected), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            mapping.for_store(&DbError::Transport("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            mapping.for_store(&DbError::Timeout {
                operation: "get",
                millis: 10
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            mapping.for_store(&DbError::Insert("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            mapping.for_store(&DbError::overflow("x", "likes")),
            StatusCode::CONFLICT
        );
        assert_eq!(mapping.for_invalid_body(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn mapping_parses() {
        assert_eq!("typed".parse::<StatusMapping>().unwrap(), StatusMapping::Typed);
        assert_eq!("Uniform".parse::<StatusMapping>().unwrap(), StatusMapping::Uniform);
        assert!("strict".parse::<StatusMapping>().is_err());
    }

    #[tokio::test]
    async fn route_not_found_body() {
        let response = ApiError::route_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "route not found" }));
    }

    #[tokio::test]
    async fn store_error_carries_message() {
        let response =
            ApiError::from_store(DbError::NotConnected, StatusMapping::Uniform).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "not connected" }));
    }
}
