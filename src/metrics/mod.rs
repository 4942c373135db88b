//! Phase-organized metrics for ingestion, querying and export.
//!
//! Each phase defines its metrics in a dedicated submodule. Recording is a
//! no-op until [`init_metrics`] installs the Prometheus recorder.

pub mod export;
pub mod ingest;
pub mod query;
pub mod registry;

pub use export::ExportMetrics;
pub use ingest::IngestMetrics;
pub use query::QueryMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the in-process Prometheus recorder and register every phase's
/// metrics. Idempotent; returns `None` if another recorder is already installed.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(handle) = HANDLE.get() {
        return Some(handle);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            registry::register_all_metrics();
            info!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
    HANDLE.get()
}

/// Render the current snapshot in Prometheus text format
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Pre-register all metrics for this phase
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Metric names follow `cohort_qc_{phase}_{name}`, with `_total` for counters
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("cohort_qc_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("cohort_qc_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("cohort_qc_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
