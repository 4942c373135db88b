//! Registers every phase's metrics and detects naming conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub fn register_all_metrics() {
    let docs = collect_docs();
    info!("Registered {} total metrics across all phases", docs.len());
    for doc in docs.values() {
        debug!("  - {} ({:?}): {}", doc.name, doc.metric_type, doc.help);
    }
}

fn collect_docs() -> HashMap<&'static str, MetricDoc> {
    let mut all_metrics = HashMap::new();
    register_phase_metrics::<super::IngestMetrics>(&mut all_metrics);
    register_phase_metrics::<super::QueryMetrics>(&mut all_metrics);
    register_phase_metrics::<super::ExportMetrics>(&mut all_metrics);
    all_metrics
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if extract_phase_from_metric_name(doc.name) != phase_name {
            warn!("Metric '{}' is documented under phase '{}'", doc.name, phase_name);
        }
        if all_metrics.contains_key(doc.name) {
            warn!("Metric name conflict detected: '{}' in phase '{}'", doc.name, phase_name);
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}

/// "cohort_qc_ingest_files_total" -> "ingest"
fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    metric_name
        .strip_prefix("cohort_qc_")
        .and_then(|rest| rest.split('_').next())
        .unwrap_or("unknown")
}
