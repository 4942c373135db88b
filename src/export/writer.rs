//! CSV rendition of an [`Export`]: `combined.csv` plus one file per table
//! that has records.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Export;
use crate::constants::{COMBINED_FILE_NAME, DESIRED_COLUMNS, MISSING_DISPLAY};
use crate::error::Result;
use crate::record::Value;
use crate::schema::{QcTable, SAMPLE_KEY};

/// Write the export under `out_dir`, creating it if needed. The combined
/// view always comes first in the returned paths. Table files left by an
/// earlier export to the same directory are removed first.
pub fn write_export(out_dir: &Path, export: &Export) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    clear_table_files(out_dir)?;
    let mut written = Vec::new();

    let combined_path = out_dir.join(COMBINED_FILE_NAME);
    let mut wtr = ::csv::Writer::from_path(&combined_path)?;
    wtr.write_record(DESIRED_COLUMNS)?;
    for row in &export.combined {
        wtr.write_record(row.values.iter().map(|v| render(v, MISSING_DISPLAY)))?;
    }
    wtr.flush()?;
    written.push(combined_path);

    for table in QcTable::ALL {
        let Some(records) = export.tables.get(&table).filter(|r| !r.is_empty()) else {
            continue;
        };

        let path = table_file(out_dir, table);
        let mut wtr = ::csv::Writer::from_path(&path)?;
        let header = std::iter::once(SAMPLE_KEY).chain(table.schema().fields.iter().map(|f| f.name));
        wtr.write_record(header)?;
        for record in records {
            let row = std::iter::once(record.sample().to_string())
                .chain(record.values().iter().map(|v| render(v, "")));
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        debug!("Wrote {} {} records to {}", records.len(), table, path.display());
        written.push(path);
    }

    Ok(written)
}

fn table_file(out_dir: &Path, table: QcTable) -> PathBuf {
    out_dir.join(format!("{}.csv", table.display_name()))
}

fn clear_table_files(out_dir: &Path) -> Result<()> {
    for table in QcTable::ALL {
        let path = table_file(out_dir, table);
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed stale {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn render(value: &Value, missing: &str) -> String {
    match value {
        Value::Null => missing.to_string(),
        v => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::compose;
    use crate::query::empty_table_data;
    use crate::record::QcRecord;
    use tempfile::tempdir;

    #[test]
    fn test_writes_combined_then_non_empty_tables() {
        let dir = tempdir().unwrap();
        let mut data = empty_table_data();
        let mut ages = QcRecord::new(QcTable::ReportedAges, "MO001");
        ages.set("age", Value::Integer(45));
        data.get_mut(&QcTable::ReportedAges).unwrap().push(ages);

        let export = compose(&["MO001".to_string(), "MS002".to_string()], &data);
        let written = write_export(dir.path(), &export).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("combined.csv"));
        assert!(written[1].ends_with("ReportedAges.csv"));

        let combined = fs::read_to_string(&written[0]).unwrap();
        let mut lines = combined.lines();
        assert_eq!(lines.next().unwrap(), DESIRED_COLUMNS.join(","));
        assert_eq!(lines.next().unwrap(), "MO001,N/A,N/A,45,N/A,N/A,N/A,N/A,N/A,N/A");
        assert!(lines.next().unwrap().starts_with("MS002,N/A"));
    }

    #[test]
    fn test_table_files_leave_nulls_blank() {
        let dir = tempdir().unwrap();
        let mut data = empty_table_data();
        let mut ages = QcRecord::new(QcTable::ReportedAges, "MO001");
        ages.set("age", Value::Integer(45));
        data.get_mut(&QcTable::ReportedAges).unwrap().push(ages);

        let written = write_export(dir.path(), &compose(&["MO001".to_string()], &data)).unwrap();
        let table = fs::read_to_string(&written[1]).unwrap();
        let mut rdr = ::csv::Reader::from_reader(table.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        let row = rdr.records().next().unwrap().unwrap();

        assert_eq!(&headers[0], "sample");
        let age = headers.iter().position(|h| h == "age").unwrap();
        assert_eq!(&row[age], "45");
        assert!(row.iter().enumerate().all(|(i, v)| i == 0 || i == age || v.is_empty()));
    }

    #[test]
    fn test_empty_export_still_writes_header() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let written = write_export(&out, &compose(&[], &empty_table_data())).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap().trim_end(),
            DESIRED_COLUMNS.join(",")
        );
    }

    #[test]
    fn test_second_export_drops_tables_it_no_longer_has() {
        let dir = tempdir().unwrap();
        let mut data = empty_table_data();
        data.get_mut(&QcTable::ReportedAges)
            .unwrap()
            .push(QcRecord::new(QcTable::ReportedAges, "MO001"));
        data.get_mut(&QcTable::BsRate)
            .unwrap()
            .push(QcRecord::new(QcTable::BsRate, "MO001"));
        write_export(dir.path(), &compose(&["MO001".to_string()], &data)).unwrap();
        assert!(dir.path().join("BsRate.csv").exists());

        let mut data = empty_table_data();
        data.get_mut(&QcTable::ReportedAges)
            .unwrap()
            .push(QcRecord::new(QcTable::ReportedAges, "MS002"));
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let written = write_export(dir.path(), &compose(&["MS002".to_string()], &data)).unwrap();

        assert_eq!(written.len(), 2);
        assert!(!dir.path().join("BsRate.csv").exists());
        assert!(dir.path().join("notes.txt").exists());
        let ages = fs::read_to_string(dir.path().join("ReportedAges.csv")).unwrap();
        assert!(ages.lines().nth(1).unwrap().starts_with("MS002,"));
    }
}
