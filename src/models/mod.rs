//! Data models for todolist.
//!
//! This module contains the todo item, its partial update, the aggregate
//! counts and the backend health report.

mod health;
mod todo;

pub use health::{HealthReport, HealthStatus};
pub use todo::{MAX_TEXT_LENGTH, Todo, TodoId, TodoPatch, TodoStats, sort_newest_first};
