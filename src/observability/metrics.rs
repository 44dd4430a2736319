//! Prometheus metrics.
//!
//! Counters are emitted through the `metrics` facade everywhere in the crate.
//! When enabled, a Prometheus recorder is installed and its handle renders the
//! text exposition for `GET /metrics`.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the Prometheus recorder if `enabled`.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(enabled: bool) -> Result<Option<PrometheusHandle>> {
    if !enabled {
        return Ok(None);
    }

    PrometheusBuilder::new()
        .install_recorder()
        .map(Some)
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_recorder_install".to_string(),
            cause: e.to_string(),
        })
}
