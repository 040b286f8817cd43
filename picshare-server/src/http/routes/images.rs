//! Image endpoints
//!
//! Each handler opens its own store session and runs
//! connect → operation → disconnect. The session is released even when the
//! operation fails; the operation's error wins over a release error.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use picshare_db::{DbError, Image, ImageStore};
use serde_json::Value;

use crate::http::error::{ApiError, StatusMapping};
use crate::state::AppState;

/// Open a connected session, mapping failures for the response.
async fn connected(state: &AppState) -> Result<Box<dyn ImageStore>, ApiError> {
    let mapping = state.status_mapping();
    let mut store = state.store();
    store
        .connect()
        .await
        .map_err(|e| ApiError::from_store(e, mapping))?;
    Ok(store)
}

/// Disconnect, then surface the operation result.
async fn release<T>(
    mut store: Box<dyn ImageStore>,
    outcome: Result<T, DbError>,
    mapping: StatusMapping,
) -> Result<T, ApiError> {
    let released = store.disconnect().await;
    let value = outcome.map_err(|e| ApiError::from_store(e, mapping))?;
    released.map_err(|e| ApiError::from_store(e, mapping))?;
    Ok(value)
}

/// GET /{id} - fetch one image
async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Image>, ApiError> {
    let mut store = connected(&state).await?;
    let outcome = store.get_image(&id).await;
    let image = release(store, outcome, state.status_mapping()).await?;

    Ok(Json(image))
}

/// POST / - store a new image
async fn save_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Image>), ApiError> {
    let mapping = state.status_mapping();
    let fields = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(ApiError::invalid_body("expected a JSON object", mapping)),
        Err(e) => return Err(ApiError::invalid_body(e, mapping)),
    };

    let mut store = connected(&state).await?;
    let outcome = store.save_image(Image::from_submission(fields)).await;
    let image = release(store, outcome, mapping).await?;

    tracing::info!(id = image.id.as_deref().unwrap_or_default(), "Image saved");
    Ok((StatusCode::CREATED, Json(image)))
}

/// POST /{id}/like - add one like
async fn like_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Image>, ApiError> {
    let mut store = connected(&state).await?;
    let outcome = store.like_image(&id).await;
    let image = release(store, outcome, state.status_mapping()).await?;

    Ok(Json(image))
}

/// Fallback for unknown paths and unregistered methods
pub async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Image routes
///
/// A registered path hit with another method is answered like an unknown
/// route (404), not with 405. HEAD is not served by the GET handler.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(save_image).fallback(route_not_found))
        .route(
            "/{id}",
            get(get_image)
                .head(route_not_found)
                .fallback(route_not_found),
        )
        .route("/{id}/like", post(like_image).fallback(route_not_found))
}
