//! # todolist
//!
//! Backend for a single-page todo-list application.
//!
//! Todos are persisted to Redis when it is reachable at startup and kept in an
//! in-process list otherwise. Both backends implement the same
//! [`TodoStorage`] contract, and [`TodoService`] picks one of them once at boot
//! and delegates to it for the rest of the process lifetime.
//!
//! ## Example
//!
//! ```rust,ignore
//! use todolist::{TodoConfig, TodoPatch, TodoService};
//!
//! let service = TodoService::connect(&TodoConfig::from_env());
//! let todo = service.create("Buy milk")?;
//! service.update(&todo.id, &TodoPatch::completed(true))?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::TodoConfig;
pub use models::{HealthReport, HealthStatus, Todo, TodoId, TodoPatch, TodoStats};
pub use services::{BackendMode, TodoOverview, TodoService};
pub use storage::{InMemoryTodoStorage, RedisTodoStorage, RetryPolicy, TodoStorage};

/// Error type for todolist operations.
///
/// A missing todo is not an error: lookups return `Option::None` instead.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty or oversized todo text |
/// | `BackendUnavailable` | Redis cannot be reached after the service committed to it |
/// | `OperationFailed` | Config I/O, server startup, unexpected backend replies |
/// | `FeatureNotEnabled` | Using a backend or transport compiled out by feature flags |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised before any backend call, so a rejected request never leaves a
    /// partial write behind.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The selected storage backend could not be reached.
    #[error("backend '{backend}' unavailable during '{operation}': {cause}")]
    BackendUnavailable {
        /// Name of the backend (`redis`).
        backend: &'static str,
        /// The operation that was attempted.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Returns true if the error means the backend could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

/// Result type alias for todolist operations.
pub type Result<T> = std::result::Result<T, Error>;
