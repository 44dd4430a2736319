//! Todo types and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Maximum accepted length of a todo's text, in characters.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Unique identifier for a todo.
///
/// Generated by the service on creation and never reused after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Creates a todo ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (UUID v4) ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TodoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A todo entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier, immutable.
    pub id: TodoId,
    /// The todo text. Never empty.
    pub text: String,
    /// Whether the todo is done.
    #[serde(default)]
    pub completed: bool,
    /// Creation time, set once.
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation; `None` until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Creates a new, not yet completed todo with a fresh ID.
    #[must_use]
    pub fn new(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TodoId::generate(),
            text: text.into(),
            completed: false,
            created_at,
            updated_at: None,
        }
    }

    /// Returns a copy with `patch` applied and `updated_at` set to `now`.
    ///
    /// Fields absent from the patch keep their current values.
    #[must_use]
    pub fn patched(&self, patch: &TodoPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.apply(patch, now);
        next
    }

    /// Applies `patch` in place and sets `updated_at` to `now`.
    pub fn apply(&mut self, patch: &TodoPatch, now: DateTime<Utc>) {
        if let Some(text) = &patch.text {
            self.text.clone_from(text);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = Some(now);
    }

    /// Compares two todos for listing order: newest `created_at` first.
    ///
    /// Equal timestamps fall back to ID order so listings are deterministic.
    #[must_use]
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Sorts todos newest first.
pub fn sort_newest_first(todos: &mut [Todo]) {
    todos.sort_by(Todo::newest_first);
}

/// A partial update to a todo.
///
/// Only the fields that are present are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// New text, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New completion state, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// A patch that only changes the text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            completed: None,
        }
    }

    /// A patch that only changes the completion state.
    #[must_use]
    pub const fn completed(completed: bool) -> Self {
        Self {
            text: None,
            completed: Some(completed),
        }
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none()
    }
}

/// Aggregate counts over the live dataset.
///
/// `completed + pending == total` always holds for values built with
/// [`TodoStats::from_todos`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    /// Number of todos.
    pub total: usize,
    /// Number of completed todos.
    pub completed: usize,
    /// Number of todos still open.
    pub pending: usize,
}

impl TodoStats {
    /// Computes stats from a set of todos.
    #[must_use]
    pub fn from_todos<'a>(todos: impl IntoIterator<Item = &'a Todo>) -> Self {
        let (total, completed) = todos.into_iter().fold((0, 0), |(total, done), todo| {
            (total + 1, done + usize::from(todo.completed))
        });
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}
