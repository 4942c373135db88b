use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::schema::{FieldType, QcTable, SAMPLE_KEY};

/// A typed field value. `Null` is the explicit "absent" state every optional
/// field starts in.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used by filter comparisons
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn matches_type(&self, ty: FieldType) -> bool {
        matches!(
            (self, ty),
            (Value::Null, _)
                | (Value::Integer(_), FieldType::Integer)
                | (Value::Real(_), FieldType::Real)
                | (Value::Text(_), FieldType::Text)
                | (Value::Date(_), FieldType::Date)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(v) => serializer.serialize_i64(*v),
            // NaN never reaches storage; coercion maps it to Null
            Value::Real(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
        }
    }
}

/// One row of one QC table.
///
/// Holds a value slot for every declared field of its table, in declaration
/// order. An upsert writes every slot, so a record always describes the full
/// stored row: a `Null` slot replaces whatever was stored before.
#[derive(Debug, Clone, PartialEq)]
pub struct QcRecord {
    table: QcTable,
    sample: String,
    values: Vec<Value>,
}

impl QcRecord {
    /// A record with every optional field `Null`
    pub fn new(table: QcTable, sample: impl Into<String>) -> Self {
        let width = table.schema().fields.len();
        Self {
            table,
            sample: sample.into(),
            values: vec![Value::Null; width],
        }
    }

    pub fn table(&self) -> QcTable {
        self.table
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Set a declared field. Returns `false` (and changes nothing) when the
    /// table has no such field or the value does not match its type.
    pub fn set(&mut self, field: &str, value: Value) -> bool {
        let schema = self.table.schema();
        match schema.position(field) {
            Some(idx) if value.matches_type(schema.fields[idx].ty) => {
                self.values[idx] = value;
                true
            }
            _ => false,
        }
    }

    /// `None` for undeclared fields; `Some(&Value::Null)` for declared but absent ones
    pub fn get(&self, field: &str) -> Option<&Value> {
        if field == SAMPLE_KEY {
            return None;
        }
        self.table.schema().position(field).map(|idx| &self.values[idx])
    }

    /// Declared fields paired with their values, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.table
            .schema()
            .fields
            .iter()
            .map(|f| f.name)
            .zip(self.values.iter())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn populated_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }
}

impl Serialize for QcRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(SAMPLE_KEY, &self.sample)?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_has_every_field_null() {
        let record = QcRecord::new(QcTable::Markdup, "MO001");
        assert_eq!(record.values().len(), 3);
        assert!(record.values().iter().all(Value::is_null));
        assert_eq!(record.get("percent_duplication"), Some(&Value::Null));
        assert_eq!(record.get("not_a_field"), None);
    }

    #[test]
    fn test_set_rejects_unknown_fields_and_wrong_types() {
        let mut record = QcRecord::new(QcTable::ReportedAges, "MO001");
        assert!(record.set("age", Value::Integer(45)));
        assert!(!record.set("age", Value::Text("45".into())));
        assert!(!record.set("shoe_size", Value::Integer(9)));
        assert_eq!(record.get("age"), Some(&Value::Integer(45)));
        assert_eq!(record.populated_count(), 1);
    }

    #[test]
    fn test_serializes_sample_first_with_nulls() {
        let mut record = QcRecord::new(QcTable::BsRate, "MO001");
        record.set("lambda_dna_conversion_rate", Value::Real(0.995));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            json!({
                "sample": "MO001",
                "puc19vector": null,
                "lambda_dna_conversion_rate": 0.995
            })
        );
    }

    #[test]
    fn test_date_serializes_as_iso() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(serde_json::to_value(Value::Date(d)).unwrap(), json!("2024-03-09"));
        assert_eq!(Value::Date(d).to_string(), "2024-03-09");
    }
}
