//! HTTP API tests.
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]
#![cfg(feature = "http")]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use todolist::http::{AppState, router};
use todolist::models::HealthReport;
use todolist::{
    BackendMode, InMemoryTodoStorage, Result, Todo, TodoId, TodoPatch, TodoService, TodoStats,
    TodoStorage,
};
use tower::ServiceExt;

fn app() -> (Router, TodoService) {
    let service = TodoService::in_memory();
    (router(AppState::new(service.clone(), None)), service)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_create_then_list() {
    let (app, _) = app();

    let (status, created) = send(&app, Method::POST, "/api/todos", Some(r#"{"text":"Buy milk"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["text"], "Buy milk");
    assert_eq!(created["completed"], false);
    assert!(created["createdAt"].is_string());
    assert!(created.get("updatedAt").is_none());

    let (status, body) = send(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todos"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["todos"][0]["id"], created["id"]);
    assert_eq!(body["stats"], json!({"total": 1, "completed": 0, "pending": 1}));
}

#[tokio::test]
async fn test_create_rejects_missing_or_blank_text() {
    let (app, service) = app();

    for body in [r"{}", r#"{"text":""}"#, r#"{"text":"   "}"#, "not json", ""] {
        let (status, value) = send(&app, Method::POST, "/api/todos", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body:?}");
        assert!(value["error"].is_string(), "body: {body:?}");
    }
    assert!(service.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_and_missing() {
    let (app, service) = app();
    let todo = service.create("A").unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/api/todos/{}", todo.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "A");

    let (status, body) = send(&app, Method::GET, "/api/todos/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_put_applies_partial_update() {
    let (app, service) = app();
    let todo = service.create("A").unwrap();
    let uri = format!("/api/todos/{}", todo.id);

    let (status, body) = send(&app, Method::PUT, &uri, Some(r#"{"completed":true}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "A");
    assert_eq!(body["completed"], true);
    assert!(body["updatedAt"].is_string());

    let (status, body) = send(&app, Method::PUT, &uri, Some(r#"{"text":"B"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "B");
    assert_eq!(body["completed"], true);
}

#[tokio::test]
async fn test_put_errors() {
    let (app, service) = app();
    let todo = service.create("A").unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/todos/{}", todo.id),
        Some(r#"{"text":""}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/api/todos/missing", Some(r#"{"completed":true}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(service.stats().unwrap().total, 1);
}

#[tokio::test]
async fn test_delete_returns_snapshot_then_404() {
    let (app, service) = app();
    let todo = service.create("A").unwrap();
    let uri = format!("/api/todos/{}", todo.id);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"]["id"], todo.id.as_str());
    assert_eq!(body["deleted"]["text"], "A");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, service) = app();
    let todo = service.create("A").unwrap();
    service.create("B").unwrap();
    service
        .update(&todo.id, &TodoPatch::completed(true))
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"total": 2, "completed": 1, "pending": 1}));
}

#[tokio::test]
async fn test_health_in_memory() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in-memory");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["mode"], "volatile");
    assert_eq!(body["stats"]["total"], 0);
}

#[tokio::test]
async fn test_metrics_disabled_is_404() {
    let (app, _) = app();
    let (status, _) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nosniff_header_is_set() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/api/stats")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}

/// A durable backend that has lost its connection.
struct DisconnectedStorage;

impl DisconnectedStorage {
    fn unavailable<T>(operation: &str) -> Result<T> {
        Err(todolist::Error::BackendUnavailable {
            backend: "redis",
            operation: operation.to_string(),
            cause: "connection refused".to_string(),
        })
    }
}

impl TodoStorage for DisconnectedStorage {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    fn list(&self) -> Result<Vec<Todo>> {
        Self::unavailable("list")
    }

    fn get(&self, _id: &TodoId) -> Result<Option<Todo>> {
        Self::unavailable("get")
    }

    fn create(&self, _todo: &Todo) -> Result<Todo> {
        Self::unavailable("create")
    }

    fn update(&self, _id: &TodoId, _patch: &TodoPatch) -> Result<Option<Todo>> {
        Self::unavailable("update")
    }

    fn delete(&self, _id: &TodoId) -> Result<Option<Todo>> {
        Self::unavailable("delete")
    }

    fn stats(&self) -> Result<TodoStats> {
        Self::unavailable("stats")
    }

    fn is_empty(&self) -> Result<bool> {
        Self::unavailable("is_empty")
    }

    fn health_check(&self) -> HealthReport {
        HealthReport::disconnected("redis", "connection refused")
    }
}

#[tokio::test]
async fn test_disconnected_backend_maps_to_503() {
    let service = TodoService::with_storage(Arc::new(DisconnectedStorage), BackendMode::Durable);
    let app = router(AppState::new(service, None));

    let (status, body) = send(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));

    let (status, _) = send(&app, Method::POST, "/api/todos", Some(r#"{"text":"A"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "disconnected");
    assert_eq!(body["mode"], "durable");
    assert_eq!(body["detail"], "connection refused");
}

#[tokio::test]
async fn test_in_memory_storage_behind_router() {
    let storage = Arc::new(InMemoryTodoStorage::new());
    let service = TodoService::with_storage(storage.clone(), BackendMode::Volatile);
    let app = router(AppState::new(service, None));

    let (status, _) = send(&app, Method::POST, "/api/todos", Some(r#"{"text":"direct"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(storage.len(), 1);
}
