//! Row normalization: canonical headers, typed values, one record per row.

pub mod coerce;
pub mod headers;
pub mod key;

pub use coerce::{Coercer, DEFAULT_SENTINELS};
pub use headers::{CanonicalRow, CollisionPolicy, HeaderNormalizer};
pub use key::normalize_key;

use tracing::debug;

use crate::error::{QcError, Result};
use crate::record::{QcRecord, Value};
use crate::schema::{QcTable, SAMPLE_KEY};
use crate::tabular::{RawCell, RawRow};

/// Where a row came from, for error context
#[derive(Debug, Clone, Copy)]
pub struct RowSource<'a> {
    pub file: &'a str,
    pub sheet: &'a str,
}

/// A normalized row plus what was lost on the way
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub record: QcRecord,
    /// Canonical names of columns the target table does not declare
    pub ignored_columns: Vec<String>,
    /// Fields whose cell was present but failed coercion
    pub nulled_fields: Vec<String>,
}

/// Header normalization followed by type coercion against a table schema.
#[derive(Default)]
pub struct RowNormalizer {
    headers: HeaderNormalizer,
    coercer: Coercer,
}

impl RowNormalizer {
    pub fn new(headers: HeaderNormalizer, coercer: Coercer) -> Self {
        Self { headers, coercer }
    }

    /// Build the record for `table` from one raw row.
    ///
    /// Only a missing sample identifier rejects the row; every other problem
    /// degrades a single field to `Null`.
    pub fn normalize(&self, table: QcTable, row: &RawRow, source: RowSource<'_>) -> Result<NormalizedRow> {
        let canonical = self.headers.normalize_row(row);
        let schema = table.schema();

        let sample = match canonical.get(SAMPLE_KEY) {
            Some(cell) if !self.coercer.is_missing(cell) => sample_text(cell),
            _ => {
                return Err(QcError::SchemaViolation {
                    file: source.file.to_string(),
                    sheet: source.sheet.to_string(),
                    row: Some(row.index),
                    reason: "missing sample identifier".to_string(),
                })
            }
        };

        let mut record = QcRecord::new(table, sample);
        let mut ignored_columns = Vec::new();
        let mut nulled_fields = Vec::new();

        for (key, cell) in &canonical.cells {
            if key == SAMPLE_KEY {
                continue;
            }
            let Some(field) = schema.field(key) else {
                ignored_columns.push(key.clone());
                continue;
            };

            let value = match self.coercer.try_coerce(field, cell) {
                Ok(v) => v,
                Err(e) => {
                    debug!(sheet = source.sheet, row = row.index, "{}", e);
                    nulled_fields.push(key.clone());
                    Value::Null
                }
            };
            record.set(field.name, value);
        }

        Ok(NormalizedRow {
            record,
            ignored_columns,
            nulled_fields,
        })
    }

    /// Check that a sheet can produce records for `table` at all.
    pub fn check_headers(&self, table: QcTable, headers: &[String], source: RowSource<'_>) -> Result<()> {
        let canonical: Vec<String> = headers.iter().map(|h| self.headers.canonical(h)).collect();
        if !canonical.iter().any(|h| h == SAMPLE_KEY) {
            return Err(QcError::SchemaViolation {
                file: source.file.to_string(),
                sheet: source.sheet.to_string(),
                row: None,
                reason: format!("no sample column for table {}", table),
            });
        }
        Ok(())
    }
}

fn sample_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Float(v) if v.fract() == 0.0 => format!("{}", *v as i64),
        other => other.describe(),
    }
}
