use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("Unsupported file kind: {path} (expected .csv or .xlsx)")]
    UnsupportedFileKind { path: PathBuf },

    #[error("Schema violation in {file}, sheet '{sheet}'{}: {reason}", row.map(|r| format!(", row {r}")).unwrap_or_default())]
    SchemaViolation {
        file: String,
        sheet: String,
        /// 1-based data row; `None` when the sheet header itself is unusable
        row: Option<usize>,
        reason: String,
    },

    #[error("Could not coerce {field}={value:?} to {expected}")]
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown filter field: {0}")]
    UnknownFilterField(String),

    #[error("No join path from the filter base table to '{table}'")]
    NoJoinPath { table: String },

    #[error("Invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    #[error("Table does not exist: {0}")]
    MissingTable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QcError {
    /// Conditions that are absorbed where they occur and never abort a call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QcError::TypeCoercion { .. } | QcError::UnknownFilterField(_))
    }
}

pub type Result<T> = std::result::Result<T, QcError>;
