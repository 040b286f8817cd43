//! Dispatcher tests against the in-memory store

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use picshare_db::{DbProvider, MemoryBackend, SessionOptions};
use picshare_server::{build_router, AppState, StatusMapping};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(backend: &MemoryBackend, mapping: StatusMapping) -> Router {
    let provider = DbProvider::new(backend.clone(), SessionOptions::default());
    build_router(AppState::new(Arc::new(provider), mapping))
}

fn app(backend: &MemoryBackend) -> Router {
    app_with(backend, StatusMapping::Uniform)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn post_creates_image() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (status, body) = send(&app, "POST", "/", Some(r#"{"url":"x.jpg"}"#)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["url"], json!("x.jpg"));
    assert_eq!(body["likes"], json!(0));
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn post_ignores_client_identity() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (status, body) = send(
        &app,
        "POST",
        "/",
        Some(r#"{"id":"mine","createdAt":"1999-01-01T00:00:00Z","url":"x.jpg"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id"], json!("mine"));
    assert_ne!(body["createdAt"], json!("1999-01-01T00:00:00Z"));
}

#[tokio::test]
async fn get_returns_saved_image() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (_, created) = send(&app, "POST", "/", Some(r#"{"url":"x.jpg","userId":"u1"}"#)).await;
    let id = created["id"].as_str().unwrap();

    let (status, fetched) = send(&app, "GET", &format!("/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn like_increments_counter() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (_, created) = send(&app, "POST", "/", Some(r#"{"url":"x.jpg"}"#)).await;
    let id = created["id"].as_str().unwrap();

    let (status, liked) = send(&app, "POST", &format!("/{id}/like"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["likes"], json!(1));

    let (_, liked) = send(&app, "POST", &format!("/{id}/like"), None).await;
    assert_eq!(liked["likes"], json!(2));
    assert_eq!(liked["url"], json!("x.jpg"));
}

#[tokio::test]
async fn unregistered_method_is_route_not_found() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (status, body) = send(&app, "DELETE", "/abc123", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "route not found" }));
}

#[tokio::test]
async fn head_is_route_not_found() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let request = Request::builder()
        .method("HEAD")
        .uri("/abc123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(backend.stats().await.opens, 0);
}

#[tokio::test]
async fn unknown_paths_are_route_not_found() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    for (method, uri) in [
        ("GET", "/"),
        ("GET", "/abc123/like"),
        ("POST", "/abc123"),
        ("GET", "/a/b/c"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body, json!({ "error": "route not found" }));
    }

    // Nothing was routed to the store
    assert_eq!(backend.stats().await.opens, 0);
}

#[tokio::test]
async fn missing_image_is_500_by_default() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (status, body) = send(&app, "GET", "/abc123", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "image abc123 not found" }));
}

#[tokio::test]
async fn like_missing_image_creates_nothing() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (status, _) = send(&app, "POST", "/abc123/like", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(backend.count("platzigram", "images").await, Some(0));
}

#[tokio::test]
async fn typed_mapping_distinguishes_failures() {
    let backend = MemoryBackend::new();
    let app = app_with(&backend, StatusMapping::Typed);

    let (status, _) = send(&app, "GET", "/abc123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/", Some("[1, 2, 3]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));

    let (_, full) = send(&app, "POST", "/", Some(&format!(r#"{{"likes":{}}}"#, i64::MAX))).await;
    let id = full["id"].as_str().unwrap();
    let (status, body) = send(&app, "POST", &format!("/{id}/like"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    backend.set_unreachable(true).await;
    let (status, _) = send(&app, "GET", "/abc123", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn insert_refusal_reports_store_detail() {
    let backend = MemoryBackend::new();
    let app = app(&backend);
    backend.refuse_inserts(Some("Duplicate primary key".into())).await;

    let (status, body) = send(&app, "POST", "/", Some(r#"{"url":"x.jpg"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Duplicate primary key" }));
}

#[tokio::test]
async fn malformed_body_is_500_by_default() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (status, body) = send(&app, "POST", "/", Some("{not json")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    // Rejected before a session was opened
    assert_eq!(backend.stats().await.opens, 0);
}

#[tokio::test]
async fn every_request_releases_its_session() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (_, created) = send(&app, "POST", "/", Some(r#"{"url":"x.jpg"}"#)).await;
    let id = created["id"].as_str().unwrap();
    send(&app, "GET", &format!("/{id}"), None).await;
    send(&app, "POST", &format!("/{id}/like"), None).await;
    send(&app, "GET", "/missing", None).await;

    let stats = backend.stats().await;
    assert_eq!(stats.opens, 4);
    assert_eq!(stats.closes, 4);
    assert_eq!(stats.databases_created, 1);
    assert_eq!(stats.tables_created, 2);
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let backend = MemoryBackend::new();
    let app = app(&backend);

    let (_, created) = send(&app, "POST", "/", Some(r#"{"url":"x.jpg"}"#)).await;
    let id = created["id"].as_str().unwrap().to_owned();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            let uri = format!("/{id}/like");
            tokio::spawn(async move { send(&app, "POST", &uri, None).await.0 })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, fetched) = send(&app, "GET", &format!("/{id}"), None).await;
    assert_eq!(fetched["likes"], json!(16));
}
