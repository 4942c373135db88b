//! Query Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct QueryMetrics;

impl QueryMetrics {
    pub fn record_filter(tables: usize, matched: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "query", "filters")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "query", "filter_tables")).record(tables as f64);
        ::metrics::histogram!(phase_metric!(histogram, "query", "filter_matches")).record(matched as f64);
        ::metrics::histogram!(phase_metric!(histogram, "query", "filter_duration_seconds")).record(duration_secs);
    }

    pub fn record_unknown_field() {
        ::metrics::counter!(phase_metric!(counter, "query", "unknown_fields")).increment(1);
    }

    pub fn record_search(mode: &'static str, matched: usize) {
        ::metrics::counter!(phase_metric!(counter, "query", "searches"), "mode" => mode).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "query", "search_matches")).record(matched as f64);
    }

    pub fn record_aggregate(samples: usize) {
        ::metrics::counter!(phase_metric!(counter, "query", "aggregations")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "query", "aggregate_samples")).record(samples as f64);
    }
}

impl PhaseMetrics for QueryMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "query", "filters"));
        let _ = counter!(phase_metric!(counter, "query", "unknown_fields"));
        let _ = counter!(phase_metric!(counter, "query", "searches"));
        let _ = counter!(phase_metric!(counter, "query", "aggregations"));
        let _ = histogram!(phase_metric!(histogram, "query", "filter_tables"));
        let _ = histogram!(phase_metric!(histogram, "query", "filter_matches"));
        let _ = histogram!(phase_metric!(histogram, "query", "filter_duration_seconds"));
        let _ = histogram!(phase_metric!(histogram, "query", "search_matches"));
        let _ = histogram!(phase_metric!(histogram, "query", "aggregate_samples"));
    }

    fn phase_name() -> &'static str {
        "query"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "query", "filters"),
                metric_type: MetricType::Counter,
                help: "Filter specs compiled and executed",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "query", "unknown_fields"),
                metric_type: MetricType::Counter,
                help: "Filter clauses dropped for an unrecognized field",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "query", "searches"),
                metric_type: MetricType::Counter,
                help: "Sample searches by resolution mode",
                labels: vec!["mode"],
            },
            MetricDoc {
                name: phase_metric!(counter, "query", "aggregations"),
                metric_type: MetricType::Counter,
                help: "Per-table aggregations",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "query", "filter_tables"),
                metric_type: MetricType::Histogram,
                help: "Tables joined per filter, base included",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "query", "filter_matches"),
                metric_type: MetricType::Histogram,
                help: "Samples matched per filter",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "query", "filter_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Filter execution time",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "query", "search_matches"),
                metric_type: MetricType::Histogram,
                help: "Samples matched per search",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "query", "aggregate_samples"),
                metric_type: MetricType::Histogram,
                help: "Samples per aggregation request",
                labels: vec![],
            },
        ]
    }
}
