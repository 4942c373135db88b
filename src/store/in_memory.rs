use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{IngestRun, QcStore, SampleQuery};
use crate::error::{QcError, Result};
use crate::record::QcRecord;
use crate::schema::{FieldDef, QcTable, SAMPLE_KEY};

#[derive(Debug, Default)]
struct MemTable {
    columns: Vec<String>,
    rows: BTreeMap<String, QcRecord>,
}

/// In-memory storage implementation for development/testing. Rows are kept
/// per table in sample order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RefCell<BTreeMap<QcTable, MemTable>>,
    runs: RefCell<Vec<IngestRun>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where `ensure_tables` has already run
    pub fn with_tables() -> Self {
        let store = Self::new();
        for table in QcTable::ALL {
            store.create_table(table);
        }
        store
    }

    /// Create one table with every declared column
    pub fn create_table(&self, table: QcTable) {
        let mut tables = self.tables.borrow_mut();
        tables.entry(table).or_insert_with(|| MemTable {
            columns: std::iter::once(SAMPLE_KEY.to_string())
                .chain(table.schema().fields.iter().map(|f| f.name.to_string()))
                .collect(),
            rows: BTreeMap::new(),
        });
    }

    pub fn drop_table(&self, table: QcTable) {
        self.tables.borrow_mut().remove(&table);
    }

    fn missing(table: QcTable) -> QcError {
        QcError::MissingTable(table.table_name().to_string())
    }
}

impl QcStore for InMemoryStore {
    fn ensure_tables(&self) -> Result<()> {
        for table in QcTable::ALL {
            self.create_table(table);
        }
        Ok(())
    }

    fn upsert(&self, record: &QcRecord) -> Result<()> {
        let mut tables = self.tables.borrow_mut();
        let data = tables
            .get_mut(&record.table())
            .ok_or_else(|| Self::missing(record.table()))?;
        data.rows.insert(record.sample().to_string(), record.clone());
        debug!("Upserted {} row for {}", record.table(), record.sample());
        Ok(())
    }

    fn table_exists(&self, table: QcTable) -> Result<bool> {
        Ok(self.tables.borrow().contains_key(&table))
    }

    fn column_names(&self, table: QcTable) -> Result<Vec<String>> {
        self.tables
            .borrow()
            .get(&table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| Self::missing(table))
    }

    fn add_column(&self, table: QcTable, field: &FieldDef) -> Result<()> {
        let mut tables = self.tables.borrow_mut();
        let data = tables.get_mut(&table).ok_or_else(|| Self::missing(table))?;
        if !data.columns.iter().any(|c| c == field.name) {
            data.columns.push(field.name.to_string());
        }
        Ok(())
    }

    fn fetch_by_samples(&self, table: QcTable, samples: &[String]) -> Result<Vec<QcRecord>> {
        let tables = self.tables.borrow();
        let data = tables.get(&table).ok_or_else(|| Self::missing(table))?;
        let wanted: BTreeSet<&str> = samples.iter().map(String::as_str).collect();
        Ok(data
            .rows
            .values()
            .filter(|r| wanted.contains(r.sample()))
            .cloned()
            .collect())
    }

    fn run_sample_query(&self, query: &SampleQuery) -> Result<Vec<String>> {
        let tables = self.tables.borrow();
        let mut joined = Vec::new();
        for table in query.tables() {
            joined.push((table, tables.get(&table).ok_or_else(|| Self::missing(table))?));
        }
        let Some((_, base)) = joined.first() else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for sample in base.rows.keys() {
            // inner join: every referenced table needs a row for this sample
            if !joined.iter().all(|(_, t)| t.rows.contains_key(sample)) {
                continue;
            }
            let matched = match query.predicate() {
                None => true,
                Some(predicate) => {
                    let lookup = |table: QcTable, column: &str| -> Option<f64> {
                        joined
                            .iter()
                            .find(|(t, _)| *t == table)
                            .and_then(|(_, data)| data.rows.get(sample))
                            .and_then(|record| record.get(column))
                            .and_then(|value| value.as_f64())
                    };
                    predicate.eval(&lookup) == Some(true)
                }
            };
            if matched {
                out.push(sample.clone());
            }
        }
        Ok(out)
    }

    fn search_samples(&self, table: QcTable, fragment: &str) -> Result<Vec<String>> {
        let tables = self.tables.borrow();
        let data = tables.get(&table).ok_or_else(|| Self::missing(table))?;
        let needle = fragment.to_lowercase();
        Ok(data
            .rows
            .keys()
            .filter(|s| s.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn list_samples(&self, table: QcTable, offset: usize, limit: usize) -> Result<Vec<String>> {
        let tables = self.tables.borrow();
        let data = tables.get(&table).ok_or_else(|| Self::missing(table))?;
        Ok(data.rows.keys().skip(offset).take(limit).cloned().collect())
    }

    fn count_samples(&self, table: QcTable) -> Result<usize> {
        let tables = self.tables.borrow();
        let data = tables.get(&table).ok_or_else(|| Self::missing(table))?;
        Ok(data.rows.len())
    }

    fn record_ingest_run(&self, run: &IngestRun) -> Result<()> {
        self.runs.borrow_mut().push(run.clone());
        Ok(())
    }

    fn ingest_runs(&self) -> Result<Vec<IngestRun>> {
        Ok(self.runs.borrow().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::spec::{CompareOp, LogicalOp};
    use crate::record::Value;
    use crate::store::{Comparison, Predicate};

    fn compare(table: QcTable, column: &'static str, op: CompareOp, value: f64) -> Predicate {
        Predicate::Compare(Comparison {
            table,
            column,
            op,
            value,
        })
    }

    #[test]
    fn test_upsert_requires_table() {
        let store = InMemoryStore::new();
        let err = store.upsert(&QcRecord::new(QcTable::Screen, "MO001")).unwrap_err();
        assert!(matches!(err, QcError::MissingTable(_)));
    }

    #[test]
    fn test_null_comparison_never_matches() {
        let store = InMemoryStore::with_tables();
        let mut with_age = QcRecord::new(QcTable::ReportedAges, "MO001");
        with_age.set("age", Value::Integer(50));
        store.upsert(&with_age).unwrap();
        store.upsert(&QcRecord::new(QcTable::ReportedAges, "MO002")).unwrap();

        let mut q = SampleQuery::new(QcTable::ReportedAges);
        q.fold(LogicalOp::And, compare(QcTable::ReportedAges, "age", CompareOp::Gt, 40.0));
        assert_eq!(store.run_sample_query(&q).unwrap(), vec!["MO001".to_string()]);

        let mut negated = SampleQuery::new(QcTable::ReportedAges);
        negated.fold(LogicalOp::And, compare(QcTable::ReportedAges, "age", CompareOp::Le, 40.0));
        assert!(store.run_sample_query(&negated).unwrap().is_empty());
    }

    #[test]
    fn test_list_and_count_follow_sample_order() {
        let store = InMemoryStore::with_tables();
        for s in ["MO003", "MO001", "MO002"] {
            store.upsert(&QcRecord::new(QcTable::ReportedAges, s)).unwrap();
        }
        assert_eq!(store.count_samples(QcTable::ReportedAges).unwrap(), 3);
        assert_eq!(
            store.list_samples(QcTable::ReportedAges, 1, 5).unwrap(),
            vec!["MO002".to_string(), "MO003".to_string()]
        );
    }
}
