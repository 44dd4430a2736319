//! Todo storage trait definition.

use crate::Result;
use crate::models::{HealthReport, Todo, TodoId, TodoPatch, TodoStats};

/// Trait for todo storage backends.
///
/// Implementations own all todo state. Callers receive clones and must
/// re-fetch to observe concurrent changes. A missing todo is reported as
/// `Ok(None)`, never as an error.
pub trait TodoStorage: Send + Sync {
    /// Short backend name used in logs, metrics and health reports.
    fn backend_name(&self) -> &'static str;

    /// Lists all todos, newest first.
    ///
    /// Index entries whose record is missing are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn list(&self) -> Result<Vec<Todo>>;

    /// Gets a todo by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn get(&self, id: &TodoId) -> Result<Option<Todo>>;

    /// Stores a fully-formed todo and adds it to the index.
    ///
    /// # Returns
    ///
    /// The stored todo.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn create(&self, todo: &Todo) -> Result<Todo>;

    /// Applies the fields present in `patch` and refreshes `updated_at`.
    ///
    /// # Returns
    ///
    /// The updated todo, or `None` if `id` does not exist. Never creates.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Option<Todo>>;

    /// Removes a todo and its index entry.
    ///
    /// # Returns
    ///
    /// The todo as it was before deletion, or `None` if it never existed or
    /// was already removed. Callers retrying a delete should treat `None` as
    /// success.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn delete(&self, id: &TodoId) -> Result<Option<Todo>>;

    /// Computes counts from the live dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn stats(&self) -> Result<TodoStats> {
        let todos = self.list()?;
        Ok(TodoStats::from_todos(&todos))
    }

    /// Returns true if the store holds no todos.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    fn is_empty(&self) -> Result<bool>;

    /// Reports backend health. Never fails.
    fn health_check(&self) -> HealthReport;
}
