//! Ingestion: tabular file → normalized records → keyed upsert.
//!
//! Sheets are processed in file order and rows in sheet order. There is no
//! transaction across upserts, so an aborted call keeps whatever rows were
//! written before the failure.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{QcError, Result};
use crate::metrics::IngestMetrics;
use crate::normalize::{RowNormalizer, RowSource};
use crate::schema::QcTable;
use crate::store::{IngestRun, QcStore};
use crate::tabular::{self, FileKind, Sheet, TabularFile};
use crate::upsert::UpsertRouter;

/// What to do with a row or sheet that cannot be mapped at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    /// Fail the whole ingestion call on the first violation
    #[default]
    Abort,
    /// Skip the offending row or sheet and report it
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// `None` when the whole sheet was rejected
    pub row: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub sheet: String,
    /// `None` when the sheet maps to no QC table
    pub table: Option<QcTable>,
    pub rows_read: usize,
    pub records_written: usize,
    pub nulled_fields: usize,
    pub ignored_columns: BTreeSet<String>,
    pub rejected: Vec<RejectedRow>,
}

impl SheetReport {
    fn new(sheet: &str, table: Option<QcTable>) -> Self {
        Self {
            sheet: sheet.to_string(),
            table,
            rows_read: 0,
            records_written: 0,
            nulled_fields: 0,
            ignored_columns: BTreeSet::new(),
            rejected: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub file_name: String,
    pub sha256: String,
    pub records_written: usize,
    pub sheets: Vec<SheetReport>,
}

pub struct IngestPipeline<'a> {
    store: &'a dyn QcStore,
    normalizer: RowNormalizer,
    policy: ViolationPolicy,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(store: &'a dyn QcStore) -> Self {
        Self {
            store,
            normalizer: RowNormalizer::default(),
            policy: ViolationPolicy::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: RowNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_policy(mut self, policy: ViolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ingest a file from disk
    pub fn ingest_path(&self, path: &Path) -> Result<IngestReport> {
        FileKind::detect(path)?;
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest_bytes(&file_name, &bytes)
    }

    /// Ingest an uploaded file. Unsupported kinds fail before any storage access.
    #[instrument(skip(self, bytes), fields(file = %file_name, bytes = bytes.len()))]
    pub fn ingest_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<IngestReport> {
        let started = Instant::now();
        let result = tabular::read_bytes(file_name, bytes).and_then(|file| {
            let sha256 = hex::encode(Sha256::digest(bytes));
            self.ingest_file(&file, sha256)
        });

        match &result {
            Ok(report) => {
                IngestMetrics::record_file_ingested(report.records_written, started.elapsed().as_secs_f64());
                info!(
                    "Ingested {}: {} records across {} sheets",
                    report.file_name,
                    report.records_written,
                    report.sheets.len()
                );
            }
            Err(e) => {
                IngestMetrics::record_file_failed();
                warn!("Ingestion of {} aborted: {}", file_name, e);
            }
        }
        result
    }

    pub(crate) fn ingest_file(&self, file: &TabularFile, sha256: String) -> Result<IngestReport> {
        let mut router = UpsertRouter::new(self.store);
        let mut sheets = Vec::with_capacity(file.sheets.len());

        for sheet in &file.sheets {
            let table = match file.kind {
                FileKind::Csv => Some(QcTable::ReportedAges),
                FileKind::Workbook => QcTable::from_sheet_name(&sheet.name),
            };
            let report = match table {
                Some(table) => self.ingest_sheet(&file.file_name, sheet, table, &mut router)?,
                None => {
                    warn!("Sheet '{}' in {} maps to no QC table; skipping", sheet.name, file.file_name);
                    IngestMetrics::record_sheet_skipped();
                    SheetReport::new(&sheet.name, None)
                }
            };
            sheets.push(report);
        }

        let run = IngestRun {
            id: Uuid::new_v4(),
            file_name: file.file_name.clone(),
            sha256,
            ingested_at: Utc::now(),
            records: router.total(),
        };
        self.store.record_ingest_run(&run)?;

        Ok(IngestReport {
            run_id: run.id,
            file_name: run.file_name,
            sha256: run.sha256,
            records_written: run.records,
            sheets,
        })
    }

    fn ingest_sheet(
        &self,
        file_name: &str,
        sheet: &Sheet,
        table: QcTable,
        router: &mut UpsertRouter<'_>,
    ) -> Result<SheetReport> {
        let mut report = SheetReport::new(&sheet.name, Some(table));
        let source = RowSource {
            file: file_name,
            sheet: &sheet.name,
        };

        if sheet.headers.is_empty() && sheet.rows.is_empty() {
            info!("Sheet '{}' is empty", sheet.name);
            return Ok(report);
        }

        if let Err(e) = self.normalizer.check_headers(table, &sheet.headers, source) {
            self.on_violation(e, &mut report)?;
            return Ok(report);
        }

        for row in &sheet.rows {
            report.rows_read += 1;
            let normalized = match self.normalizer.normalize(table, row, source) {
                Ok(n) => n,
                Err(e @ QcError::SchemaViolation { .. }) => {
                    self.on_violation(e, &mut report)?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            IngestMetrics::record_fields_nulled(normalized.nulled_fields.len());
            report.nulled_fields += normalized.nulled_fields.len();
            report.ignored_columns.extend(normalized.ignored_columns);

            router.route(&normalized.record)?;
            report.records_written += 1;
        }

        if !report.ignored_columns.is_empty() {
            warn!(
                "Sheet '{}': ignored columns not declared on {}: {:?}",
                sheet.name, table, report.ignored_columns
            );
        }
        Ok(report)
    }

    /// Abort: hand the violation back. Skip: record it and carry on.
    fn on_violation(&self, err: QcError, report: &mut SheetReport) -> Result<()> {
        match (self.policy, err) {
            (ViolationPolicy::Skip, QcError::SchemaViolation { row, reason, .. }) => {
                warn!("Skipping {} in sheet '{}': {}", describe_row(row), report.sheet, reason);
                IngestMetrics::record_row_rejected();
                report.rejected.push(RejectedRow { row, reason });
                Ok(())
            }
            (_, err) => Err(err),
        }
    }
}

fn describe_row(row: Option<usize>) -> String {
    match row {
        Some(r) => format!("row {r}"),
        None => "sheet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use crate::store::InMemoryStore;
    use calamine::Data;

    #[test]
    fn test_csv_goes_to_ages_and_is_recorded_in_ledger() {
        let store = InMemoryStore::with_tables();
        let report = IngestPipeline::new(&store)
            .ingest_bytes("ages.csv", b"Sample,age,WBC\nMO001,45,3.2\nMO002,NaN,abc\n")
            .unwrap();

        assert_eq!(report.records_written, 2);
        assert_eq!(report.sheets[0].table, Some(QcTable::ReportedAges));
        assert_eq!(report.sheets[0].nulled_fields, 1);
        assert_eq!(report.sha256.len(), 64);

        let runs = store.ingest_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, report.run_id);

        let rows = store
            .fetch_by_samples(QcTable::ReportedAges, &["MO002".to_string()])
            .unwrap();
        assert_eq!(rows[0].get("age"), Some(&Value::Null));
        assert_eq!(rows[0].get("wbc"), Some(&Value::Null));
    }

    #[test]
    fn test_unsupported_file_never_touches_storage() {
        let store = InMemoryStore::new();
        let err = IngestPipeline::new(&store).ingest_bytes("notes.txt", b"hello").unwrap_err();
        assert!(matches!(err, QcError::UnsupportedFileKind { .. }));
        assert!(store.ingest_runs().unwrap().is_empty());
    }

    #[test]
    fn test_abort_policy_stops_at_first_bad_row() {
        let store = InMemoryStore::with_tables();
        let err = IngestPipeline::new(&store)
            .ingest_bytes("ages.csv", b"Sample,age\nMO001,45\n,50\nMO003,60\n")
            .unwrap_err();
        assert!(matches!(err, QcError::SchemaViolation { row: Some(2), .. }));
        // rows before the violation stay written
        assert_eq!(store.count_samples(QcTable::ReportedAges).unwrap(), 1);
        assert!(store.ingest_runs().unwrap().is_empty());
    }

    #[test]
    fn test_skip_policy_reports_and_continues() {
        let store = InMemoryStore::with_tables();
        let report = IngestPipeline::new(&store)
            .with_policy(ViolationPolicy::Skip)
            .ingest_bytes("ages.csv", b"Sample,age\nMO001,45\nN/A,50\nMO003,60\n")
            .unwrap();
        assert_eq!(report.records_written, 2);
        assert_eq!(report.sheets[0].rejected.len(), 1);
        assert_eq!(report.sheets[0].rejected[0].row, Some(2));
    }

    #[test]
    fn test_sheet_without_sample_column_is_a_violation() {
        let store = InMemoryStore::with_tables();
        let err = IngestPipeline::new(&store)
            .ingest_bytes("ages.csv", b"id,age\nMO001,45\n")
            .unwrap_err();
        assert!(matches!(err, QcError::SchemaViolation { row: None, .. }));

        let report = IngestPipeline::new(&store)
            .with_policy(ViolationPolicy::Skip)
            .ingest_bytes("ages.csv", b"id,age\nMO001,45\n")
            .unwrap();
        assert_eq!(report.records_written, 0);
        assert_eq!(report.sheets[0].rejected[0].row, None);
    }

    fn workbook(sheets: Vec<Sheet>) -> TabularFile {
        TabularFile {
            file_name: "qc.xlsx".to_string(),
            kind: FileKind::Workbook,
            sheets,
        }
    }

    fn sheet(name: &str, rows: Vec<Vec<Data>>) -> Sheet {
        tabular::workbook::sheet_from_rows(name, rows.iter().map(|r| r.as_slice()))
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_workbook_sheets_route_by_name_in_file_order() {
        let store = InMemoryStore::with_tables();
        let file = workbook(vec![
            sheet(
                "picard.hs",
                vec![
                    vec![s("Sample"), s("SAMPLE"), s("PCT_SELECTED_BASES"), s("ON_BAIT_BASES"), s("PCT_OFF_BAIT")],
                    vec![s("MO001"), s("CAP12WGS_MO001_L1"), Data::Float(0.82), Data::Float(1200.0), s("12.5%")],
                ],
            ),
            sheet("notes", vec![vec![s("Sample"), s("comment")], vec![s("MO001"), s("ok")]]),
            sheet("ages", vec![vec![s("Sample"), s("age")], vec![s("MO001"), Data::Int(45)]]),
        ]);

        let report = IngestPipeline::new(&store).ingest_file(&file, "00".repeat(32)).unwrap();

        let order: Vec<(&str, Option<QcTable>)> = report
            .sheets
            .iter()
            .map(|r| (r.sheet.as_str(), r.table))
            .collect();
        assert_eq!(
            order,
            vec![
                ("picard.hs", Some(QcTable::PicardHs)),
                ("notes", None),
                ("ages", Some(QcTable::ReportedAges)),
            ]
        );
        assert_eq!(report.sheets[1].records_written, 0);
        assert_eq!(report.records_written, 2);

        let hs = store.fetch_by_samples(QcTable::PicardHs, &["MO001".to_string()]).unwrap();
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].get("pct_selected_bases"), Some(&Value::Real(0.82)));
        assert_eq!(hs[0].get("on_bait_bases"), Some(&Value::Integer(1200)));
        assert_eq!(hs[0].get("pct_off_bait"), Some(&Value::Real(0.125)));

        let ages = store.fetch_by_samples(QcTable::ReportedAges, &["MO001".to_string()]).unwrap();
        assert_eq!(ages[0].get("age"), Some(&Value::Integer(45)));
        assert_eq!(store.ingest_runs().unwrap()[0].records, 2);
    }

    #[test]
    fn test_empty_and_headerless_workbook_sheets() {
        let store = InMemoryStore::with_tables();
        let file = workbook(vec![
            sheet("screen", Vec::new()),
            sheet("fastp", vec![vec![s("id"), s("total_reads")], vec![s("MO001"), Data::Int(10)]]),
        ]);

        let err = IngestPipeline::new(&store)
            .ingest_file(&file, String::new())
            .unwrap_err();
        assert!(matches!(err, QcError::SchemaViolation { ref sheet, row: None, .. } if sheet == "fastp"));

        let report = IngestPipeline::new(&store)
            .with_policy(ViolationPolicy::Skip)
            .ingest_file(&file, String::new())
            .unwrap();
        assert_eq!(report.sheets[0].table, Some(QcTable::Screen));
        assert_eq!(report.sheets[0].rows_read, 0);
        assert_eq!(report.sheets[1].rejected.len(), 1);
    }
}
