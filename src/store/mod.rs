//! Storage collaborator: keyed upsert, introspection and the sample query
//! builder, with a SQLite backend and an in-memory one.

pub mod in_memory;
pub mod query;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use query::{Comparison, Predicate, SampleQuery};
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::Result;
use crate::record::QcRecord;
use crate::schema::{FieldDef, QcTable};

/// One recorded ingestion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestRun {
    pub id: Uuid,
    pub file_name: String,
    /// Hex SHA-256 of the file bytes
    pub sha256: String,
    pub ingested_at: DateTime<Utc>,
    pub records: usize,
}

/// Storage trait for the QC tables.
///
/// `upsert` is the only write path for QC records. It replaces every
/// declared column of the stored row, so after the call the stored row
/// equals the record.
pub trait QcStore {
    /// Create missing QC tables and the ingest ledger
    fn ensure_tables(&self) -> Result<()>;

    fn upsert(&self, record: &QcRecord) -> Result<()>;

    fn table_exists(&self, table: QcTable) -> Result<bool>;
    fn column_names(&self, table: QcTable) -> Result<Vec<String>>;
    fn add_column(&self, table: QcTable, field: &FieldDef) -> Result<()>;

    /// Records of `table` whose sample is in `samples`, ordered by sample
    fn fetch_by_samples(&self, table: QcTable, samples: &[String]) -> Result<Vec<QcRecord>>;

    /// Distinct samples satisfying the query, ordered by sample
    fn run_sample_query(&self, query: &SampleQuery) -> Result<Vec<String>>;

    /// Distinct samples of `table` containing `fragment`, ignoring case
    fn search_samples(&self, table: QcTable, fragment: &str) -> Result<Vec<String>>;

    fn list_samples(&self, table: QcTable, offset: usize, limit: usize) -> Result<Vec<String>>;
    fn count_samples(&self, table: QcTable) -> Result<usize>;

    fn record_ingest_run(&self, run: &IngestRun) -> Result<()>;
    fn ingest_runs(&self) -> Result<Vec<IngestRun>>;
}

/// Where the database lives. A handle is opened per request and dropped
/// when the request finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    File(PathBuf),
    Memory,
}

impl Database {
    /// Parse a `DATABASE_URL`-style location: a path, `sqlite://path`, or `:memory:`
    pub fn from_url(url: &str) -> Self {
        let trimmed = url.trim();
        let path = trimmed
            .strip_prefix("sqlite:///")
            .map(|p| format!("/{p}"))
            .or_else(|| trimmed.strip_prefix("sqlite://").map(str::to_string))
            .unwrap_or_else(|| trimmed.to_string());
        if path == ":memory:" {
            Database::Memory
        } else {
            Database::File(PathBuf::from(path))
        }
    }

    /// Open a handle without touching the schema
    pub fn connect(&self) -> Result<SqliteStore> {
        match self {
            Database::File(path) => SqliteStore::open(path),
            Database::Memory => SqliteStore::open_in_memory(),
        }
    }

    /// Open a handle and bring the schema up to date
    pub fn open(&self) -> Result<SqliteStore> {
        let store = self.connect()?;
        crate::migrate::apply(&store)?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_forms() {
        assert_eq!(Database::from_url("cohort.db"), Database::File(PathBuf::from("cohort.db")));
        assert_eq!(
            Database::from_url("sqlite://data/cohort.db"),
            Database::File(PathBuf::from("data/cohort.db"))
        );
        assert_eq!(
            Database::from_url("sqlite:///var/lib/cohort.db"),
            Database::File(PathBuf::from("/var/lib/cohort.db"))
        );
        assert_eq!(Database::from_url(":memory:"), Database::Memory);
    }
}
