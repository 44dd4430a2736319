//! REST API over [`TodoService`].
//!
//! Handlers map HTTP verbs directly onto service operations. Storage calls are
//! synchronous, so each one runs on the blocking pool.

mod handlers;

use crate::config::TodoConfig;
use crate::observability::PrometheusHandle;
use crate::services::TodoService;
use crate::{Error, Result};
use axum::Router;
use axum::http::header;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub use handlers::ApiError;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    service: TodoService,
    prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub const fn new(service: TodoService, prometheus: Option<PrometheusHandle>) -> Self {
        Self {
            service,
            prometheus,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/api/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route("/api/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API until the process is stopped.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created or the address cannot be
/// bound.
pub fn serve(
    config: &TodoConfig,
    service: TodoService,
    prometheus: Option<PrometheusHandle>,
) -> Result<()> {
    let mode = service.mode();
    let app = router(AppState::new(service, prometheus));

    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    let addr = config.bind_address();
    tracing::info!(address = %addr, %mode, "Starting todo HTTP server");

    rt.block_on(async {
        let listener =
            tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|e| Error::OperationFailed {
                    operation: "bind".to_string(),
                    cause: format!("{addr}: {e}"),
                })?;

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "serve".to_string(),
                cause: e.to_string(),
            })
    })
}
