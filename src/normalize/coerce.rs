//! Raw cell → declared field type.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{QcError, Result};
use crate::record::Value;
use crate::schema::{FieldDef, FieldType};
use crate::tabular::RawCell;

pub const DEFAULT_SENTINELS: &[&str] = &["NaN", "nan", "NA", "N/A", "#N/A", ""];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d", "%d-%b-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Converts cells to typed values. Missing-value sentinels are mapped to
/// `Null` before any conversion is attempted.
#[derive(Debug, Clone)]
pub struct Coercer {
    sentinels: Vec<String>,
}

impl Default for Coercer {
    fn default() -> Self {
        Self::with_sentinels(DEFAULT_SENTINELS.iter().map(|s| s.to_string()))
    }
}

impl Coercer {
    pub fn with_sentinels<I: IntoIterator<Item = String>>(sentinels: I) -> Self {
        Self {
            sentinels: sentinels.into_iter().map(|s| s.trim().to_string()).collect(),
        }
    }

    pub fn is_missing(&self, cell: &RawCell) -> bool {
        match cell {
            RawCell::Empty => true,
            RawCell::Float(v) => v.is_nan(),
            RawCell::Text(s) => {
                let s = s.trim();
                s.is_empty() || self.sentinels.iter().any(|m| m == s)
            }
            _ => false,
        }
    }

    /// Coerce a cell, absorbing failures into `Null`.
    pub fn coerce(&self, field: &FieldDef, cell: &RawCell) -> Value {
        match self.try_coerce(field, cell) {
            Ok(value) => value,
            Err(e) => {
                debug!("{}; storing null", e);
                Value::Null
            }
        }
    }

    /// Coerce a cell; a malformed cell yields `QcError::TypeCoercion`.
    pub fn try_coerce(&self, field: &FieldDef, cell: &RawCell) -> Result<Value> {
        if self.is_missing(cell) {
            return Ok(Value::Null);
        }

        let converted = match field.ty {
            FieldType::Integer => to_integer(cell).map(Value::Integer),
            FieldType::Real => to_real(cell).map(Value::Real),
            FieldType::Text => Some(Value::Text(to_text(cell))),
            FieldType::Date => to_date(cell).map(Value::Date),
        };

        converted.ok_or_else(|| QcError::TypeCoercion {
            field: field.name.to_string(),
            value: cell.describe(),
            expected: field.ty.as_str(),
        })
    }
}

fn to_integer(cell: &RawCell) -> Option<i64> {
    match cell {
        RawCell::Int(v) => Some(*v),
        RawCell::Float(v) => integral(*v),
        RawCell::Bool(v) => Some(i64::from(*v)),
        RawCell::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        RawCell::Empty | RawCell::Date(_) => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn to_real(cell: &RawCell) -> Option<f64> {
    let v = match cell {
        RawCell::Int(v) => *v as f64,
        RawCell::Float(v) => *v,
        RawCell::Text(s) => {
            let s = s.trim();
            // "12.5%" style values from hand-edited sheets
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
                None => s.parse::<f64>().ok()?,
            }
        }
        RawCell::Empty | RawCell::Bool(_) | RawCell::Date(_) => return None,
    };
    v.is_finite().then_some(v)
}

fn to_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Float(v) => match integral(*v) {
            Some(i) => i.to_string(),
            None => v.to_string(),
        },
        RawCell::Text(s) => s.trim().to_string(),
        other => other.describe(),
    }
}

fn to_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Date(d) => Some(*d),
        RawCell::Int(v) => from_serial(*v as f64),
        RawCell::Float(v) => from_serial(*v),
        RawCell::Text(s) => parse_date_text(s.trim()),
        RawCell::Empty | RawCell::Bool(_) => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Spreadsheet serial day number (1900 date system)
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}
