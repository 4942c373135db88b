//! Tabular sources: turn a CSV file or a workbook into ordered sheets of
//! header→cell rows. Headers are kept verbatim; normalization happens
//! downstream.

pub mod csv;
pub mod workbook;

use chrono::NaiveDate;
use std::path::Path;

use crate::error::{QcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Workbook,
}

impl FileKind {
    /// Detect from the file extension (case-insensitive)
    pub fn detect(path: &Path) -> Result<FileKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(FileKind::Csv),
            Some("xlsx") | Some("xlsm") | Some("xls") => Ok(FileKind::Workbook),
            _ => Err(QcError::UnsupportedFileKind {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// A raw cell as produced by the source, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl RawCell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s)
        }
    }

    /// Display form used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Int(v) => v.to_string(),
            RawCell::Float(v) => v.to_string(),
            RawCell::Bool(v) => v.to_string(),
            RawCell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One data row: cells paired with their verbatim header, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based data row number (the header row is not counted)
    pub index: usize,
    pub cells: Vec<(String, RawCell)>,
}

impl RawRow {
    pub fn new(index: usize, cells: Vec<(String, RawCell)>) -> Self {
        Self { index, cells }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, c)| matches!(c, RawCell::Empty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// A parsed tabular file
#[derive(Debug, Clone)]
pub struct TabularFile {
    pub file_name: String,
    pub kind: FileKind,
    pub sheets: Vec<Sheet>,
}

/// Parse an in-memory upload. The kind is detected from `file_name`.
pub fn read_bytes(file_name: &str, bytes: &[u8]) -> Result<TabularFile> {
    let kind = FileKind::detect(Path::new(file_name))?;

    let sheets = match kind {
        FileKind::Csv => {
            let stem = Path::new(file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.to_string());
            vec![self::csv::read_sheet(&stem, bytes)?]
        }
        FileKind::Workbook => workbook::read_sheets(bytes)?,
    };

    Ok(TabularFile {
        file_name: file_name.to_string(),
        kind,
        sheets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detects_kinds_by_extension() {
        assert_eq!(FileKind::detect(Path::new("ages.csv")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::detect(Path::new("QC.XLSX")).unwrap(), FileKind::Workbook);
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let err = FileKind::detect(Path::new("notes.txt")).unwrap_err();
        match err {
            QcError::UnsupportedFileKind { path } => assert_eq!(path, PathBuf::from("notes.txt")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(FileKind::detect(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_csv_bytes_become_one_sheet_named_after_stem() {
        let file = read_bytes("ages.csv", b"Sample,age\nMO001,45\n").unwrap();
        assert_eq!(file.kind, FileKind::Csv);
        assert_eq!(file.sheets.len(), 1);
        assert_eq!(file.sheets[0].name, "ages");
    }

    #[test]
    fn test_unsupported_upload_fails_before_parsing() {
        assert!(matches!(
            read_bytes("report.pdf", b"%PDF"),
            Err(QcError::UnsupportedFileKind { .. })
        ));
    }

    #[test]
    fn test_blank_row_detection() {
        let row = RawRow::new(1, vec![("a".into(), RawCell::Empty), ("b".into(), RawCell::text(""))]);
        assert!(row.is_blank());
    }
}
