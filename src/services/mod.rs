//! Business logic services.
//!
//! Services pick a storage backend and provide the operations the HTTP layer
//! and CLI call.

mod backend_factory;
mod seed;
mod todo;

pub use backend_factory::{BackendFactory, BackendMode, BackendSelection};
pub use seed::{DEFAULT_TODO_TEXTS, default_todos};
pub use todo::{TodoOverview, TodoService};
