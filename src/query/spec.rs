use jsonschema::JSONSchema;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{QcError, Result};

static FILTER_SPEC_SCHEMA_JSON: Lazy<JsonValue> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/filter_spec.v1.json")).unwrap_or(JsonValue::Null)
});

static FILTER_SPEC_SCHEMA: OnceCell<JSONSchema> = OnceCell::new();

/// The compiled filter spec JSON Schema
pub fn filter_spec_schema() -> Result<&'static JSONSchema> {
    FILTER_SPEC_SCHEMA.get_or_try_init(|| {
        if FILTER_SPEC_SCHEMA_JSON.is_null() {
            return Err(QcError::Config("embedded filter spec schema is not valid JSON".into()));
        }
        JSONSchema::options()
            .compile(&FILTER_SPEC_SCHEMA_JSON)
            .map_err(|e| QcError::Config(format!("failed to compile filter spec schema: {e}")))
    })
}

/// Schema violations of a filter spec document, one message per error
pub fn schema_errors(instance: &JsonValue) -> Result<Vec<String>> {
    let compiled = filter_spec_schema()?;
    let errors = match compiled.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect(),
    };
    Ok(errors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
        }
    }

    /// SQL spelling of the operator
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            other => other.symbol(),
        }
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn sql(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    /// SQL three-valued combination; `None` is unknown
    pub fn apply(&self, lhs: Option<bool>, rhs: Option<bool>) -> Option<bool> {
        match self {
            LogicalOp::And => match (lhs, rhs) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            LogicalOp::Or => match (lhs, rhs) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        }
    }
}

/// One `field op value` comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub field: String,
    pub op: CompareOp,
    pub value: f64,
}

impl FilterExpression {
    pub fn new(field: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }
}

/// Ordered comparisons with the connectives between them. `operators[i]`
/// joins `expressions[i]` and `expressions[i + 1]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub expressions: Vec<FilterExpression>,
    #[serde(default)]
    pub operators: Vec<LogicalOp>,
}

#[derive(Deserialize)]
struct LegacyFilterSpec {
    filters: BTreeMap<String, (CompareOp, f64)>,
}

impl FilterSpec {
    pub fn new(first: FilterExpression) -> Self {
        Self {
            expressions: vec![first],
            operators: Vec::new(),
        }
    }

    /// Append `op expr` to the end of the spec
    pub fn then(mut self, op: LogicalOp, expr: FilterExpression) -> Self {
        if !self.expressions.is_empty() {
            self.operators.push(op);
        }
        self.expressions.push(expr);
        self
    }

    /// Parse and schema-check a filter spec document. The legacy
    /// `{"filters": {field: [op, value]}}` form joins every clause with `and`.
    pub fn from_json_str(input: &str) -> Result<FilterSpec> {
        let instance: JsonValue = serde_json::from_str(input)?;
        let errors = schema_errors(&instance)?;
        if !errors.is_empty() {
            return Err(QcError::InvalidFilterSpec(errors.join("; ")));
        }

        if instance.get("filters").is_some() {
            let legacy: LegacyFilterSpec = serde_json::from_value(instance)?;
            let mut spec = FilterSpec::default();
            for (field, (op, value)) in legacy.filters {
                spec = spec.then(LogicalOp::And, FilterExpression::new(field, op, value));
            }
            return Ok(spec);
        }

        Ok(serde_json::from_value(instance)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_expression_form() {
        let spec = FilterSpec::from_json_str(
            r#"{"expressions":[{"field":"age","op":">=","value":40},{"field":"pct_selected_bases","op":"<","value":0.8}],"operators":["or"]}"#,
        )
        .unwrap();
        assert_eq!(spec.expressions.len(), 2);
        assert_eq!(spec.expressions[0].op, CompareOp::Ge);
        assert_eq!(spec.operators, vec![LogicalOp::Or]);
    }

    #[test]
    fn test_legacy_map_joins_with_and() {
        let spec = FilterSpec::from_json_str(
            r#"{"filters":{"percent_duplication":["<=",0.2],"fold_80_base_penalty":[">",1.1]}}"#,
        )
        .unwrap();
        assert_eq!(spec.expressions.len(), 2);
        assert_eq!(spec.operators, vec![LogicalOp::And]);
    }

    #[test]
    fn test_schema_rejects_unknown_operator() {
        let err = FilterSpec::from_json_str(
            r#"{"expressions":[{"field":"age","op":"!=","value":1}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, QcError::InvalidFilterSpec(_)));
    }

    #[test]
    fn test_schema_rejects_non_numeric_value() {
        let instance = serde_json::json!({"expressions":[{"field":"age","op":"<","value":"old"}]});
        assert!(!schema_errors(&instance).unwrap().is_empty());
    }

    #[test]
    fn test_three_valued_connectives() {
        assert_eq!(LogicalOp::And.apply(None, Some(false)), Some(false));
        assert_eq!(LogicalOp::And.apply(None, Some(true)), None);
        assert_eq!(LogicalOp::Or.apply(None, Some(true)), Some(true));
        assert_eq!(LogicalOp::Or.apply(None, Some(false)), None);
    }

    #[test]
    fn test_then_keeps_operators_one_shorter() {
        let spec = FilterSpec::default()
            .then(LogicalOp::Or, FilterExpression::new("age", CompareOp::Gt, 1.0))
            .then(LogicalOp::Or, FilterExpression::new("age", CompareOp::Lt, 9.0));
        assert_eq!(spec.operators.len(), 1);
    }
}
