//! In-memory todo storage.
//!
//! Used when Redis is unreachable at startup. Data is lost on restart; the
//! service reseeds it with the same defaults a fresh Redis store receives.

use crate::Result;
use crate::models::{HealthReport, Todo, TodoId, TodoPatch, sort_newest_first};
use crate::storage::TodoStorage;
use chrono::Utc;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory todo storage.
///
/// A single `RwLock` guards the whole list, so every operation is atomic with
/// respect to every other one.
///
/// # Example
///
/// ```rust
/// use todolist::{InMemoryTodoStorage, Todo, TodoStorage};
///
/// let storage = InMemoryTodoStorage::new();
/// let todo = Todo::new("Buy milk", chrono::Utc::now());
/// storage.create(&todo).unwrap();
/// assert_eq!(storage.list().unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTodoStorage {
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryTodoStorage {
    /// Backend name reported in logs and health checks.
    pub const NAME: &'static str = "memory";

    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of todos stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Todo>> {
        self.todos.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Todo>> {
        self.todos.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TodoStorage for InMemoryTodoStorage {
    fn backend_name(&self) -> &'static str {
        Self::NAME
    }

    fn list(&self) -> Result<Vec<Todo>> {
        let mut todos = self.read().clone();
        sort_newest_first(&mut todos);
        Ok(todos)
    }

    fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
        Ok(self.read().iter().find(|t| &t.id == id).cloned())
    }

    fn create(&self, todo: &Todo) -> Result<Todo> {
        let mut todos = self.write();
        // Replace rather than duplicate if the same ID is stored twice.
        if let Some(existing) = todos.iter_mut().find(|t| t.id == todo.id) {
            existing.clone_from(todo);
        } else {
            todos.push(todo.clone());
        }
        Ok(todo.clone())
    }

    fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Option<Todo>> {
        let mut todos = self.write();
        let Some(todo) = todos.iter_mut().find(|t| &t.id == id) else {
            return Ok(None);
        };
        todo.apply(patch, Utc::now());
        Ok(Some(todo.clone()))
    }

    fn delete(&self, id: &TodoId) -> Result<Option<Todo>> {
        let mut todos = self.write();
        let position = todos.iter().position(|t| &t.id == id);
        Ok(position.map(|idx| todos.remove(idx)))
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.read().is_empty())
    }

    fn health_check(&self) -> HealthReport {
        HealthReport::in_memory(Self::NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthStatus, TodoStats};
    use chrono::{DateTime, Duration};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap_or_default()
    }

    fn store_with(texts: &[&str]) -> (InMemoryTodoStorage, Vec<Todo>) {
        let storage = InMemoryTodoStorage::new();
        let mut created = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let todo = Todo::new(*text, at(0) + Duration::seconds(i as i64));
            created.push(storage.create(&todo).expect("create"));
        }
        (storage, created)
    }

    #[test]
    fn test_empty_store() {
        let storage = InMemoryTodoStorage::new();
        assert!(storage.list().expect("list").is_empty());
        assert!(storage.is_empty().expect("is_empty"));
        assert_eq!(storage.stats().expect("stats"), TodoStats::default());
    }

    #[test]
    fn test_create_then_get() {
        let (storage, created) = store_with(&["A"]);
        let fetched = storage.get(&created[0].id).expect("get");
        assert_eq!(fetched.as_ref(), Some(&created[0]));
        assert!(!storage.is_empty().expect("is_empty"));
    }

    #[test]
    fn test_get_missing_is_none() {
        let storage = InMemoryTodoStorage::new();
        assert!(storage.get(&TodoId::new("nope")).expect("get").is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let (storage, _) = store_with(&["A", "B", "C"]);
        let texts: Vec<_> = storage
            .list()
            .expect("list")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_update_is_partial() {
        let (storage, created) = store_with(&["A"]);
        let updated = storage
            .update(&created[0].id, &TodoPatch::completed(true))
            .expect("update")
            .expect("todo exists");

        assert_eq!(updated.text, "A");
        assert!(updated.completed);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, created[0].created_at);
    }

    #[test]
    fn test_update_missing_does_not_create() {
        let storage = InMemoryTodoStorage::new();
        let result = storage
            .update(&TodoId::new("ghost"), &TodoPatch::text("boo"))
            .expect("update");
        assert!(result.is_none());
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_delete_twice() {
        let (storage, created) = store_with(&["A"]);
        let id = &created[0].id;

        let first = storage.delete(id).expect("delete");
        assert_eq!(first.as_ref().map(|t| t.text.as_str()), Some("A"));

        let second = storage.delete(id).expect("delete");
        assert!(second.is_none());
        assert!(storage.get(id).expect("get").is_none());
    }

    #[test]
    fn test_stats_track_completion() {
        let (storage, created) = store_with(&["A", "B", "C"]);
        storage
            .update(&created[1].id, &TodoPatch::completed(true))
            .expect("update");

        let stats = storage.stats().expect("stats");
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
    }

    #[test]
    fn test_create_same_id_replaces() {
        let (storage, created) = store_with(&["A"]);
        let mut again = created[0].clone();
        again.text = "A2".to_string();
        storage.create(&again).expect("create");

        assert_eq!(storage.len(), 1);
        let fetched = storage.get(&again.id).expect("get").expect("exists");
        assert_eq!(fetched.text, "A2");
    }

    #[test]
    fn test_health_is_in_memory() {
        let report = InMemoryTodoStorage::new().health_check();
        assert_eq!(report.status, HealthStatus::InMemory);
        assert_eq!(report.backend, "memory");
    }
}
