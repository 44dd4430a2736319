//! Backend health reporting.

use serde::Serialize;
use std::fmt;

/// Health of the active storage backend.
///
/// `InMemory` is an expected operating mode, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    /// Durable backend reachable and responsive.
    Healthy,
    /// Volatile backend active by design.
    InMemory,
    /// Durable backend was selected but is no longer reachable.
    Disconnected,
}

impl HealthStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::InMemory => "in-memory",
            Self::Disconnected => "disconnected",
        }
    }

    /// Returns true if the service can answer requests.
    #[must_use]
    pub const fn is_serving(&self) -> bool {
        matches!(self, Self::Healthy | Self::InMemory)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a backend health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Backend that produced the report (`redis` or `memory`).
    pub backend: &'static str,
    /// Error text when disconnected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthReport {
    /// A healthy durable backend.
    #[must_use]
    pub const fn healthy(backend: &'static str) -> Self {
        Self {
            status: HealthStatus::Healthy,
            backend,
            detail: None,
        }
    }

    /// The in-memory backend.
    #[must_use]
    pub const fn in_memory(backend: &'static str) -> Self {
        Self {
            status: HealthStatus::InMemory,
            backend,
            detail: None,
        }
    }

    /// A durable backend that can no longer be reached.
    #[must_use]
    pub fn disconnected(backend: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Disconnected,
            backend,
            detail: Some(detail.into()),
        }
    }
}
