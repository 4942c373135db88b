//! Export Composer: flatten per-table data into one combined per-sample
//! view plus the raw per-table record lists.

pub mod writer;

pub use writer::write_export;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::constants::DESIRED_COLUMNS;
use crate::error::Result;
use crate::metrics::ExportMetrics;
use crate::query::{Aggregator, TableData};
use crate::record::Value;
use crate::schema::{QcTable, SAMPLE_KEY};
use crate::store::QcStore;

/// One row of the combined view: values for [`DESIRED_COLUMNS`], in order
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub sample: String,
    pub values: Vec<Value>,
}

impl CombinedRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        DESIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| &self.values[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    /// One row per requested sample, in request order
    pub combined: Vec<CombinedRow>,
    /// Fetched records per table, unmodified
    pub tables: TableData,
}

/// Per-sample field map built by merging records in table order. A later
/// table overwrites a same-named field from an earlier one, null included.
pub fn merged_fields(data: &TableData) -> HashMap<&str, HashMap<&'static str, &Value>> {
    let mut merged: HashMap<&str, HashMap<&'static str, &Value>> = HashMap::new();
    for table in QcTable::ALL {
        let Some(records) = data.get(&table) else {
            continue;
        };
        for record in records {
            let fields = merged.entry(record.sample()).or_default();
            for (name, value) in record.fields() {
                fields.insert(name, value);
            }
        }
    }
    merged
}

/// Build the combined view for `samples` and keep the raw tables alongside
pub fn compose(samples: &[String], data: &TableData) -> Export {
    let merged = merged_fields(data);

    let mut seen = HashSet::new();
    let combined = samples
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .map(|sample| {
            let fields = merged.get(sample.as_str());
            let values = DESIRED_COLUMNS
                .iter()
                .map(|column| {
                    if *column == SAMPLE_KEY {
                        return Value::Text(sample.clone());
                    }
                    fields
                        .and_then(|f| f.get(column))
                        .map(|v| (*v).clone())
                        .unwrap_or_default()
                })
                .collect();
            CombinedRow {
                sample: sample.clone(),
                values,
            }
        })
        .collect();

    Export {
        combined,
        tables: data.clone(),
    }
}

/// Fetch, compose and write a download for `samples` into `out_dir`.
/// Returns the written file paths, combined view first.
#[instrument(skip(store, samples), fields(samples = samples.len(), out_dir = %out_dir.display()))]
pub fn export_samples(store: &dyn QcStore, samples: &[String], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let data = Aggregator::new(store).collect(samples)?;
    let export = compose(samples, &data);
    let written = write_export(out_dir, &export)?;

    ExportMetrics::record_export(export.combined.len(), written.len().saturating_sub(1));
    info!(
        "Exported {} samples to {} ({} files)",
        export.combined.len(),
        out_dir.display(),
        written.len()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::empty_table_data;
    use crate::record::QcRecord;

    fn record(table: QcTable, sample: &str, fields: &[(&str, Value)]) -> QcRecord {
        let mut r = QcRecord::new(table, sample);
        for (name, value) in fields {
            assert!(r.set(name, value.clone()), "{name}");
        }
        r
    }

    #[test]
    fn test_combined_rows_follow_request_order_once_each() {
        let mut data = empty_table_data();
        data.get_mut(&QcTable::ReportedAges).unwrap().extend([
            record(QcTable::ReportedAges, "MO001", &[("age", Value::Integer(45))]),
            record(QcTable::ReportedAges, "MO002", &[("age", Value::Integer(51))]),
        ]);
        let samples = vec!["MO002".to_string(), "MO001".to_string(), "MO002".to_string()];
        let export = compose(&samples, &data);

        let order: Vec<&str> = export.combined.iter().map(|r| r.sample.as_str()).collect();
        assert_eq!(order, vec!["MO002", "MO001"]);
        assert_eq!(export.combined[0].get("age"), Some(&Value::Integer(51)));
        assert_eq!(export.combined[0].get("sample"), Some(&Value::Text("MO002".into())));
    }

    #[test]
    fn test_sample_without_records_gets_a_row_of_nulls() {
        let export = compose(&["MS404".to_string()], &empty_table_data());
        assert_eq!(export.combined.len(), 1);
        assert!(export.combined[0].values[1..].iter().all(Value::is_null));
    }

    #[test]
    fn test_values_are_drawn_across_tables() {
        let mut data = empty_table_data();
        data.get_mut(&QcTable::BsRate).unwrap().push(record(
            QcTable::BsRate,
            "MO001",
            &[("lambda_dna_conversion_rate", Value::Real(0.995))],
        ));
        data.get_mut(&QcTable::PicardHs).unwrap().push(record(
            QcTable::PicardHs,
            "MO001",
            &[("fold_80_base_penalty", Value::Real(1.3))],
        ));
        let row = &compose(&["MO001".to_string()], &data).combined[0];
        assert_eq!(row.get("lambda_dna_conversion_rate"), Some(&Value::Real(0.995)));
        assert_eq!(row.get("fold_80_base_penalty"), Some(&Value::Real(1.3)));
        assert_eq!(row.get("gender"), Some(&Value::Null));
    }

    #[test]
    fn test_later_table_overwrites_earlier_even_with_null() {
        // total_reads is declared on fastp, picard_alignment_summary, picard_hs and
        // picard_quality_yield; the merged map keeps the last table's value
        let mut data = empty_table_data();
        data.get_mut(&QcTable::PicardHs).unwrap().push(record(
            QcTable::PicardHs,
            "MO001",
            &[("total_reads", Value::Integer(100))],
        ));
        data.get_mut(&QcTable::PicardQualityYield)
            .unwrap()
            .push(record(QcTable::PicardQualityYield, "MO001", &[]));

        let merged = merged_fields(&data);
        assert_eq!(merged["MO001"].get("total_reads"), Some(&&Value::Null));

        // and compose applies the same rule to the desired columns
        let mut data = empty_table_data();
        data.get_mut(&QcTable::ReportedAges).unwrap().push(record(
            QcTable::ReportedAges,
            "MO001",
            &[("age", Value::Integer(45))],
        ));
        let row = &compose(&["MO001".to_string()], &data).combined[0];
        assert_eq!(row.get("age"), Some(&Value::Integer(45)));
    }
}
