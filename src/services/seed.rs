//! Default todos for a first run.

use crate::models::Todo;
use chrono::{DateTime, Duration, Utc};

/// Texts of the default todos, in listing order (newest first).
pub const DEFAULT_TODO_TEXTS: [&str; 3] = [
    "Welcome to your todo list!",
    "Click the checkbox to mark a todo as complete",
    "Delete todos you no longer need",
];

/// Builds the default todos.
///
/// Timestamps step back one millisecond per entry from `now` so the listing
/// order matches [`DEFAULT_TODO_TEXTS`].
#[must_use]
pub fn default_todos(now: DateTime<Utc>) -> Vec<Todo> {
    DEFAULT_TODO_TEXTS
        .iter()
        .zip(0_i64..)
        .map(|(text, offset)| Todo::new(*text, now - Duration::milliseconds(offset)))
        .collect()
}
