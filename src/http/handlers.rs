//! Request handlers.

use super::AppState;
use crate::Error;
use crate::models::{HealthStatus, Todo, TodoId, TodoPatch, TodoStats};
use crate::services::{BackendMode, TodoService};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// An error response: a status code and a JSON `{"error": message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Todo not found")
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::OperationFailed { .. } | Error::FeatureNotEnabled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct CreateTodoRequest {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: Todo,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: HealthStatus,
    backend: &'static str,
    mode: BackendMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<TodoStats>,
}

/// Runs a service call on the blocking pool.
async fn blocking<T, F>(state: &AppState, call: F) -> ApiResult<T>
where
    F: FnOnce(&TodoService) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(ApiError::from)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

pub(super) async fn list_todos(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let overview = blocking(&state, TodoService::overview).await?;
    Ok(Json(overview))
}

pub(super) async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = TodoId::from(id);
    let todo = blocking(&state, move |s| s.get(&id)).await?;
    todo.map(Json).ok_or_else(ApiError::not_found)
}

pub(super) async fn create_todo(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<impl IntoResponse> {
    let request: CreateTodoRequest = parse_body(&body)?;
    let text = request
        .text
        .ok_or_else(|| ApiError::bad_request("todo text is required"))?;

    let todo = blocking(&state, move |s| s.create(&text)).await?;
    tracing::debug!(id = %todo.id, "Created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

pub(super) async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<impl IntoResponse> {
    let patch: TodoPatch = parse_body(&body)?;
    let id = TodoId::from(id);

    let todo = blocking(&state, move |s| s.update(&id, &patch)).await?;
    todo.map(Json).ok_or_else(ApiError::not_found)
}

pub(super) async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = TodoId::from(id);
    let deleted = blocking(&state, move |s| s.delete(&id)).await?;
    deleted
        .map(|deleted| Json(Deleted { deleted }))
        .ok_or_else(ApiError::not_found)
}

pub(super) async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let stats = blocking(&state, TodoService::stats).await?;
    Ok(Json(stats))
}

pub(super) async fn health(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let response = blocking(&state, |s| {
        let report = s.health();
        let stats = if report.status.is_serving() {
            s.stats().ok()
        } else {
            None
        };
        Ok(HealthResponse {
            status: report.status,
            backend: report.backend,
            mode: s.mode(),
            detail: report.detail,
            stats,
        })
    })
    .await?;

    let code = if response.status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((code, Json(response)))
}

pub(super) async fn metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ApiError::new(StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}
