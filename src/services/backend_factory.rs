//! Backend factory for storage layer initialization.
//!
//! Picks the storage backend once at startup:
//!
//! ```text
//! REDIS_URL unset ──────────────────────────────▶ InMemoryTodoStorage (Volatile)
//! REDIS_URL set ──▶ RedisTodoStorage::connect ──┬▶ RedisTodoStorage    (Durable)
//!                      (bounded retries)        └▶ InMemoryTodoStorage (Volatile)
//! ```
//!
//! # Graceful Degradation
//!
//! A failed connection is logged and answered with the in-memory backend; it is
//! never a startup error. There is no later switch back to Redis.

use crate::config::TodoConfig;
use crate::storage::{InMemoryTodoStorage, RedisTodoStorage, TodoStorage};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Which backend the service committed to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Redis is active.
    Durable,
    /// The in-memory list is active.
    Volatile,
}

impl BackendMode {
    /// Returns the mode as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Volatile => "volatile",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The backend chosen at startup.
pub struct BackendSelection {
    /// The storage to delegate to.
    pub storage: Arc<dyn TodoStorage>,
    /// How it was chosen.
    pub mode: BackendMode,
}

/// Factory for creating storage backends.
pub struct BackendFactory;

impl BackendFactory {
    /// Selects the backend for `config`.
    ///
    /// Never fails: anything short of a working Redis connection yields the
    /// in-memory backend.
    #[must_use]
    pub fn select(config: &TodoConfig) -> BackendSelection {
        let Some(url) = config.redis_url.as_deref() else {
            tracing::info!("REDIS_URL not set, using in-memory storage");
            return Self::volatile();
        };

        match RedisTodoStorage::connect(url, &config.redis) {
            Ok(storage) => BackendSelection {
                storage: Arc::new(storage),
                mode: BackendMode::Durable,
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Redis unavailable, falling back to in-memory storage"
                );
                Self::volatile()
            },
        }
    }

    /// The in-memory backend.
    #[must_use]
    pub fn volatile() -> BackendSelection {
        BackendSelection {
            storage: Arc::new(InMemoryTodoStorage::new()),
            mode: BackendMode::Volatile,
        }
    }
}
