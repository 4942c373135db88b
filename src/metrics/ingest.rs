//! Ingest Phase Metrics
//!
//! Files and rows read, records upserted per table, and the rows that were
//! dropped or degraded on the way.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::schema::QcTable;

pub struct IngestMetrics;

impl IngestMetrics {
    pub fn record_file_ingested(records: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "ingest", "files")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "ingest", "file_records")).record(records as f64);
        ::metrics::histogram!(phase_metric!(histogram, "ingest", "duration_seconds")).record(duration_secs);
    }

    pub fn record_file_failed() {
        ::metrics::counter!(phase_metric!(counter, "ingest", "files_failed")).increment(1);
    }

    pub fn record_upsert(table: QcTable) {
        ::metrics::counter!(
            phase_metric!(counter, "ingest", "records_upserted"),
            "table" => table.display_name()
        )
        .increment(1);
    }

    pub fn record_fields_nulled(count: usize) {
        if count > 0 {
            ::metrics::counter!(phase_metric!(counter, "ingest", "fields_nulled")).increment(count as u64);
        }
    }

    pub fn record_row_rejected() {
        ::metrics::counter!(phase_metric!(counter, "ingest", "rows_rejected")).increment(1);
    }

    pub fn record_sheet_skipped() {
        ::metrics::counter!(phase_metric!(counter, "ingest", "sheets_skipped")).increment(1);
    }
}

impl PhaseMetrics for IngestMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "ingest", "files"));
        let _ = counter!(phase_metric!(counter, "ingest", "files_failed"));
        let _ = counter!(phase_metric!(counter, "ingest", "records_upserted"));
        let _ = counter!(phase_metric!(counter, "ingest", "fields_nulled"));
        let _ = counter!(phase_metric!(counter, "ingest", "rows_rejected"));
        let _ = counter!(phase_metric!(counter, "ingest", "sheets_skipped"));
        let _ = histogram!(phase_metric!(histogram, "ingest", "file_records"));
        let _ = histogram!(phase_metric!(histogram, "ingest", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "ingest"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ingest", "files"),
                metric_type: MetricType::Counter,
                help: "Files ingested successfully",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "files_failed"),
                metric_type: MetricType::Counter,
                help: "Ingestion calls that aborted",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "records_upserted"),
                metric_type: MetricType::Counter,
                help: "Records written through the keyed upsert",
                labels: vec!["table"],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "fields_nulled"),
                metric_type: MetricType::Counter,
                help: "Cells that failed type coercion and were stored as null",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "rows_rejected"),
                metric_type: MetricType::Counter,
                help: "Rows skipped for a schema violation",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "sheets_skipped"),
                metric_type: MetricType::Counter,
                help: "Workbook sheets that map to no QC table",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "ingest", "file_records"),
                metric_type: MetricType::Histogram,
                help: "Records written per file",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "ingest", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of one ingestion call",
                labels: vec![],
            },
        ]
    }
}
