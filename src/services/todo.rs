//! Todo service.
//!
//! The facade the rest of the application talks to. It owns the backend chosen
//! at startup and forwards every call to it; there is no per-call fallback.

use crate::config::TodoConfig;
use crate::models::{HealthReport, MAX_TEXT_LENGTH, Todo, TodoId, TodoPatch, TodoStats};
use crate::services::backend_factory::{BackendFactory, BackendMode};
use crate::services::seed::default_todos;
use crate::storage::{InMemoryTodoStorage, TodoStorage};
use crate::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// All todos plus their counts, as served by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoOverview {
    /// Todos, newest first.
    pub todos: Vec<Todo>,
    /// Counts over `todos`.
    pub stats: TodoStats,
}

/// Service for managing todos.
#[derive(Clone)]
pub struct TodoService {
    storage: Arc<dyn TodoStorage>,
    mode: BackendMode,
}

impl TodoService {
    /// Selects a backend for `config`, then seeds it if empty.
    ///
    /// Never fails: an unreachable Redis yields an in-memory service, and a
    /// seeding failure is logged.
    #[must_use]
    pub fn connect(config: &TodoConfig) -> Self {
        let selection = BackendFactory::select(config);
        let service = Self::with_storage(selection.storage, selection.mode);

        tracing::info!(
            mode = %service.mode,
            backend = service.backend_name(),
            "Storage backend selected"
        );
        metrics::gauge!("todo_backend_selected", "mode" => service.mode.as_str()).set(1.0);

        match service.seed_if_empty() {
            Ok(0) => {},
            Ok(seeded) => tracing::info!(seeded, "Seeded default todos"),
            Err(e) => tracing::warn!(error = %e, "Failed to seed default todos"),
        }

        service
    }

    /// Creates a service over an already chosen backend.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn TodoStorage>, mode: BackendMode) -> Self {
        Self { storage, mode }
    }

    /// Creates an empty, unseeded in-memory service.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(InMemoryTodoStorage::new()), BackendMode::Volatile)
    }

    /// Returns the backend mode chosen at startup.
    #[must_use]
    pub const fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Returns the backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }

    /// Lists all todos, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn list(&self) -> Result<Vec<Todo>> {
        self.execute("list", |s| s.list())
    }

    /// Lists all todos together with their counts.
    ///
    /// Stats are derived from the same listing, so they always match it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn overview(&self) -> Result<TodoOverview> {
        let todos = self.list()?;
        let stats = TodoStats::from_todos(&todos);
        Ok(TodoOverview { todos, stats })
    }

    /// Gets a todo by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
        self.execute("get", |s| s.get(id))
    }

    /// Creates a todo from `text`.
    ///
    /// The text is trimmed; ID and creation time are assigned here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty or oversized text (before touching the
    /// backend), or an error if the backend cannot be accessed.
    pub fn create(&self, text: &str) -> Result<Todo> {
        let text = validate_text(text)?;
        let todo = Todo::new(text, Utc::now());
        self.execute("create", |s| s.create(&todo))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the patch carries empty or oversized text, or
    /// an error if the backend cannot be accessed.
    pub fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Option<Todo>> {
        let patch = TodoPatch {
            text: patch.text.as_deref().map(validate_text).transpose()?,
            completed: patch.completed,
        };
        self.execute("update", |s| s.update(id, &patch))
    }

    /// Deletes a todo, returning it as it was.
    ///
    /// `Ok(None)` means nothing was there; a retried delete should count that
    /// as success.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn delete(&self, id: &TodoId) -> Result<Option<Todo>> {
        self.execute("delete", |s| s.delete(id))
    }

    /// Returns counts over the live dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn stats(&self) -> Result<TodoStats> {
        self.execute("stats", |s| s.stats())
    }

    /// Reports backend health.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        let report = self.storage.health_check();
        if !report.status.is_serving() {
            tracing::warn!(
                backend = report.backend,
                detail = report.detail.as_deref().unwrap_or_default(),
                "Storage backend unhealthy"
            );
        }
        report
    }

    /// Stores the default todos if the store is empty.
    ///
    /// # Returns
    ///
    /// The number of todos written (0 if anything already existed).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn seed_if_empty(&self) -> Result<usize> {
        if !self.execute("is_empty", |s| s.is_empty())? {
            return Ok(0);
        }

        let defaults = default_todos(Utc::now());
        for todo in &defaults {
            self.execute("create", |s| s.create(todo))?;
        }
        Ok(defaults.len())
    }

    /// Runs a storage call, recording its outcome.
    fn execute<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: FnOnce(&dyn TodoStorage) -> Result<T>,
    {
        let started = Instant::now();
        let result = call(self.storage.as_ref());
        let backend = self.storage.backend_name();

        let status = match &result {
            Ok(_) => "success",
            Err(e) if e.is_unavailable() => "unavailable",
            Err(_) => "error",
        };
        if let Err(e) = &result {
            tracing::error!(backend, operation, error = %e, "Storage operation failed");
        }

        metrics::counter!(
            "todo_storage_requests_total",
            "backend" => backend,
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "todo_storage_duration_ms",
            "backend" => backend,
            "operation" => operation
        )
        .record(started.elapsed().as_secs_f64() * 1000.0);

        result
    }
}

/// Trims `text` and checks it is non-empty and within the length limit.
fn validate_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("todo text is required".to_string()));
    }
    let len = trimmed.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(Error::InvalidInput(format!(
            "todo text is {len} characters (max {MAX_TEXT_LENGTH})"
        )));
    }
    Ok(trimmed.to_string())
}
