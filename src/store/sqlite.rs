use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use super::{IngestRun, QcStore, SampleQuery};
use crate::error::Result;
use crate::record::{QcRecord, Value};
use crate::schema::{FieldDef, FieldType, QcTable, SAMPLE_KEY};

/// Upper bound on bound parameters per `IN (...)` lookup
const SAMPLE_CHUNK: usize = 500;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!("Opened database at {}", path.as_ref().display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Raw connection, for migrations and tests
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn create_table_sql(table: QcTable) -> String {
    let schema = table.schema();
    let mut columns = vec![format!("{SAMPLE_KEY} TEXT PRIMARY KEY")];
    columns.extend(
        schema
            .fields
            .iter()
            .map(|f| format!("{} {}", quote(f.name), f.ty.sql_type())),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(table.table_name()),
        columns.join(", ")
    )
}

fn upsert_sql(table: QcTable) -> String {
    let schema = table.schema();
    let names: Vec<String> = schema.fields.iter().map(|f| quote(f.name)).collect();
    let placeholders: Vec<String> = (1..=names.len() + 1).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = names.iter().map(|n| format!("{n}=excluded.{n}")).collect();

    let mut sql = format!(
        "INSERT INTO {} ({SAMPLE_KEY}{}{}) VALUES ({})",
        quote(table.table_name()),
        if names.is_empty() { "" } else { ", " },
        names.join(", "),
        placeholders.join(", ")
    );
    if updates.is_empty() {
        sql.push_str(&format!(" ON CONFLICT({SAMPLE_KEY}) DO NOTHING"));
    } else {
        sql.push_str(&format!(
            " ON CONFLICT({SAMPLE_KEY}) DO UPDATE SET {}",
            updates.join(", ")
        ));
    }
    sql
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Date(d) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Text(d.format("%Y-%m-%d").to_string()))
            }
        })
    }
}

/// Stored cell → declared type. Cells that no longer fit the declared type read as `Null`.
fn read_value(ty: FieldType, raw: ValueRef<'_>) -> Value {
    match (ty, raw) {
        (_, ValueRef::Null) => Value::Null,
        (FieldType::Integer, ValueRef::Integer(v)) => Value::Integer(v),
        (FieldType::Integer, ValueRef::Real(v)) if v.fract() == 0.0 => Value::Integer(v as i64),
        (FieldType::Real, ValueRef::Real(v)) => Value::Real(v),
        (FieldType::Real, ValueRef::Integer(v)) => Value::Real(v as f64),
        (FieldType::Text, ValueRef::Text(b)) => Value::Text(String::from_utf8_lossy(b).into_owned()),
        (FieldType::Text, ValueRef::Integer(v)) => Value::Text(v.to_string()),
        (FieldType::Text, ValueRef::Real(v)) => Value::Text(v.to_string()),
        (FieldType::Date, ValueRef::Text(b)) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(Value::Date)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

impl QcStore for SqliteStore {
    fn ensure_tables(&self) -> Result<()> {
        for table in QcTable::ALL {
            self.conn.execute_batch(&create_table_sql(table))?;
        }
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ingest_runs (
                id           TEXT PRIMARY KEY,
                file_name    TEXT NOT NULL,
                sha256       TEXT NOT NULL,
                ingested_at  TEXT NOT NULL,
                records      INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn upsert(&self, record: &QcRecord) -> Result<()> {
        let sql = upsert_sql(record.table());
        let sample = Value::Text(record.sample().to_string());
        let params = std::iter::once(&sample).chain(record.values().iter());
        self.conn.execute(&sql, params_from_iter(params))?;
        Ok(())
    }

    fn table_exists(&self, table: QcTable) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.table_name()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn column_names(&self, table: QcTable) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote(table.table_name())))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn add_column(&self, table: QcTable, field: &FieldDef) -> Result<()> {
        self.conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote(table.table_name()),
            quote(field.name),
            field.ty.sql_type()
        ))?;
        Ok(())
    }

    fn fetch_by_samples(&self, table: QcTable, samples: &[String]) -> Result<Vec<QcRecord>> {
        let schema = table.schema();
        let columns: Vec<String> = schema.fields.iter().map(|f| quote(f.name)).collect();
        let mut records = Vec::new();
        // a sample repeated across chunks would otherwise come back twice
        let unique: Vec<&String> = samples.iter().collect::<BTreeSet<_>>().into_iter().collect();

        for chunk in unique.chunks(SAMPLE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {SAMPLE_KEY}{}{} FROM {} WHERE {SAMPLE_KEY} IN ({placeholders})",
                if columns.is_empty() { "" } else { ", " },
                columns.join(", "),
                quote(table.table_name()),
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                let sample: String = row.get(0)?;
                let mut record = QcRecord::new(table, sample);
                for (i, field) in schema.fields.iter().enumerate() {
                    record.set(field.name, read_value(field.ty, row.get_ref(i + 1)?));
                }
                records.push(record);
            }
        }

        // chunks come back in arbitrary order
        records.sort_by(|a, b| a.sample().cmp(b.sample()));
        Ok(records)
    }

    fn run_sample_query(&self, query: &SampleQuery) -> Result<Vec<String>> {
        let (sql, params) = query.to_sql();
        debug!("Sample query: {} {:?}", sql, params);
        let mut stmt = self.conn.prepare(&sql)?;
        let samples = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    fn search_samples(&self, table: QcTable, fragment: &str) -> Result<Vec<String>> {
        let escaped = fragment
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let sql = format!(
            "SELECT DISTINCT {SAMPLE_KEY} FROM {} WHERE {SAMPLE_KEY} LIKE ?1 ESCAPE '\\' ORDER BY {SAMPLE_KEY}",
            quote(table.table_name())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let samples = stmt
            .query_map(params![format!("%{escaped}%")], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    fn list_samples(&self, table: QcTable, offset: usize, limit: usize) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {SAMPLE_KEY} FROM {} ORDER BY {SAMPLE_KEY} LIMIT ?1 OFFSET ?2",
            quote(table.table_name())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let samples = stmt
            .query_map(params![limit as i64, offset as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    fn count_samples(&self, table: QcTable) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(table.table_name())),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn record_ingest_run(&self, run: &IngestRun) -> Result<()> {
        self.conn.execute(
            "INSERT INTO ingest_runs (id, file_name, sha256, ingested_at, records) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.id.to_string(),
                run.file_name,
                run.sha256,
                run.ingested_at.to_rfc3339(),
                run.records as i64
            ],
        )?;
        Ok(())
    }

    fn ingest_runs(&self) -> Result<Vec<IngestRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, sha256, ingested_at, records FROM ingest_runs ORDER BY rowid",
        )?;
        let runs = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let ingested_at: String = row.get(3)?;
                Ok(IngestRun {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
                    file_name: row.get(1)?,
                    sha256: row.get(2)?,
                    ingested_at: DateTime::parse_from_rfc3339(&ingested_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
                    records: row.get::<_, i64>(4)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::spec::{CompareOp, LogicalOp};
    use crate::store::{Comparison, Predicate};

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_tables().unwrap();
        store
    }

    fn ages(sample: &str, age: Option<i64>, wbc: Option<f64>) -> QcRecord {
        let mut r = QcRecord::new(QcTable::ReportedAges, sample);
        if let Some(a) = age {
            r.set("age", Value::Integer(a));
        }
        if let Some(w) = wbc {
            r.set("wbc", Value::Real(w));
        }
        r
    }

    #[test]
    fn test_upsert_replaces_whole_row() {
        let s = store();
        s.upsert(&ages("MO001", Some(45), Some(3.2))).unwrap();
        s.upsert(&ages("MO001", Some(46), None)).unwrap();

        let rows = s.fetch_by_samples(QcTable::ReportedAges, &["MO001".to_string()]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("age"), Some(&Value::Integer(46)));
        assert_eq!(rows[0].get("wbc"), Some(&Value::Null));
        assert_eq!(s.count_samples(QcTable::ReportedAges).unwrap(), 1);
    }

    #[test]
    fn test_repeated_samples_across_chunks_come_back_once() {
        let s = store();
        s.upsert(&ages("MO001", Some(45), None)).unwrap();
        s.upsert(&ages("MO002", Some(51), None)).unwrap();

        let mut samples: Vec<String> = (0..SAMPLE_CHUNK).map(|i| format!("XX{i:04}")).collect();
        samples[0] = "MO001".to_string();
        samples.push("MO001".to_string());
        samples.push("MO002".to_string());

        let rows = s.fetch_by_samples(QcTable::ReportedAges, &samples).unwrap();
        let found: Vec<&str> = rows.iter().map(|r| r.sample()).collect();
        assert_eq!(found, vec!["MO001", "MO002"]);
    }

    #[test]
    fn test_dates_round_trip_as_iso_text() {
        let s = store();
        let mut r = QcRecord::new(QcTable::ReportedAges, "MO002");
        let d = NaiveDate::from_ymd_opt(2022, 11, 3).unwrap();
        r.set("sample_date", Value::Date(d));
        s.upsert(&r).unwrap();

        let raw: String = s
            .connection()
            .query_row("SELECT sample_date FROM reported_ages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "2022-11-03");
        let rows = s.fetch_by_samples(QcTable::ReportedAges, &["MO002".to_string()]).unwrap();
        assert_eq!(rows[0], r);
    }

    #[test]
    fn test_introspection_and_add_column() {
        let s = SqliteStore::open_in_memory().unwrap();
        assert!(!s.table_exists(QcTable::Screen).unwrap());
        s.connection()
            .execute_batch("CREATE TABLE screen (sample TEXT PRIMARY KEY, human REAL)")
            .unwrap();
        assert!(s.table_exists(QcTable::Screen).unwrap());
        s.add_column(QcTable::Screen, &FieldDef { name: "sample_r1r2", ty: FieldType::Text })
            .unwrap();
        assert_eq!(s.column_names(QcTable::Screen).unwrap(), vec!["sample", "human", "sample_r1r2"]);
    }

    #[test]
    fn test_sample_query_inner_joins_exclude_missing_rows() {
        let s = store();
        for (sample, rate) in [("MO001", 0.995), ("MO002", 0.999)] {
            let mut r = QcRecord::new(QcTable::BsRate, sample);
            r.set("lambda_dna_conversion_rate", Value::Real(rate));
            s.upsert(&r).unwrap();
        }
        let mut hs = QcRecord::new(QcTable::PicardHs, "MO001");
        hs.set("pct_selected_bases", Value::Real(0.7));
        s.upsert(&hs).unwrap();

        let mut q = SampleQuery::new(QcTable::BsRate);
        q.join(QcTable::PicardHs);
        q.fold(
            LogicalOp::And,
            Predicate::Compare(Comparison {
                table: QcTable::BsRate,
                column: "lambda_dna_conversion_rate",
                op: CompareOp::Gt,
                value: 0.99,
            }),
        );
        assert_eq!(s.run_sample_query(&q).unwrap(), vec!["MO001".to_string()]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_literal() {
        let s = store();
        for sample in ["MO001", "mo002", "MS_003", "MSX04"] {
            s.upsert(&ages(sample, None, None)).unwrap();
        }
        assert_eq!(
            s.search_samples(QcTable::ReportedAges, "mo00").unwrap(),
            vec!["MO001".to_string(), "mo002".to_string()]
        );
        assert_eq!(s.search_samples(QcTable::ReportedAges, "MS_").unwrap(), vec!["MS_003".to_string()]);
    }

    #[test]
    fn test_ingest_ledger_round_trip() {
        let s = store();
        let run = IngestRun {
            id: Uuid::new_v4(),
            file_name: "qc.xlsx".into(),
            sha256: "ab".repeat(32),
            ingested_at: Utc::now(),
            records: 12,
        };
        s.record_ingest_run(&run).unwrap();
        let runs = s.ingest_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, run.id);
        assert_eq!(runs[0].records, 12);
    }
}
