//! Export Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct ExportMetrics;

impl ExportMetrics {
    pub fn record_export(combined_rows: usize, tables_written: usize) {
        ::metrics::counter!(phase_metric!(counter, "export", "exports")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "export", "files_written")).increment(tables_written as u64 + 1);
        ::metrics::gauge!(phase_metric!(gauge, "export", "last_combined_rows")).set(combined_rows as f64);
    }
}

impl PhaseMetrics for ExportMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = counter!(phase_metric!(counter, "export", "exports"));
        let _ = counter!(phase_metric!(counter, "export", "files_written"));
        let _ = gauge!(phase_metric!(gauge, "export", "last_combined_rows"));
    }

    fn phase_name() -> &'static str {
        "export"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "export", "exports"),
                metric_type: MetricType::Counter,
                help: "Download exports produced",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "export", "files_written"),
                metric_type: MetricType::Counter,
                help: "CSV files written, combined view included",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(gauge, "export", "last_combined_rows"),
                metric_type: MetricType::Gauge,
                help: "Rows in the most recent combined view",
                labels: vec![],
            },
        ]
    }
}
