//! # Observability
//!
//! Prometheus metrics for federated calls.
//!
//! ## Features
//!
//! - Prometheus exporter
//! - Metric hooks for `dispatcher::MultiBackend`: a Prometheus recorder
//!   and an in-memory per-backend summary
//!
//! Logging is set up by the binary; this crate only emits `tracing` events.
//!
//! ## Example
//!
//! ```ignore
//! use observability::{combine, prometheus_metric_fn, BackendCallStats};
//!
//! observability::init_metrics_only(9090)?;
//!
//! let stats = BackendCallStats::new(names.clone());
//! let proxy = MultiBackend::new(backends, window)
//!     .with_metric_fn(combine(vec![prometheus_metric_fn(names), stats.hook()]));
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

// Re-exports
pub use crate::metrics::{
    combine, prometheus_metric_fn, record_backend_call, BackendCallStats, BackendSummary,
    CallStatsSummary, RunningStats, StatsSummary,
};

/// Install the Prometheus exporter as the global `metrics` recorder
///
/// Serves `/metrics` on `0.0.0.0:port`. Fails if a recorder is already
/// installed.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
