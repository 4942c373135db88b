use cohort_qc::query::spec::schema_errors;
use cohort_qc::query::{CompareOp, FilterSpec, LogicalOp};
use jsonschema::JSONSchema;
use serde_json::json;

fn compiled() -> JSONSchema {
    let schema = include_str!("../schemas/filter_spec.v1.json");
    let schema_json: serde_json::Value = serde_json::from_str(schema).unwrap();
    let schema_static: &'static serde_json::Value = Box::leak(Box::new(schema_json));
    JSONSchema::options().compile(schema_static).unwrap()
}

#[test]
fn expression_example_is_valid() {
    let instance = include_str!("resources/filter_spec_expressions.json");
    let instance_json: serde_json::Value = serde_json::from_str(instance).unwrap();
    assert!(compiled().is_valid(&instance_json));

    let spec = FilterSpec::from_json_str(instance).unwrap();
    assert_eq!(spec.expressions.len(), 3);
    assert_eq!(spec.operators, vec![LogicalOp::And, LogicalOp::Or]);
    assert_eq!(spec.expressions[1].op, CompareOp::Lt);
}

#[test]
fn legacy_example_is_valid() {
    let instance = include_str!("resources/filter_spec_legacy.json");
    let instance_json: serde_json::Value = serde_json::from_str(instance).unwrap();
    assert!(compiled().is_valid(&instance_json));

    let spec = FilterSpec::from_json_str(instance).unwrap();
    assert_eq!(spec.expressions.len(), 2);
    assert!(spec.operators.iter().all(|op| *op == LogicalOp::And));
}

#[test]
fn unknown_comparison_is_rejected() {
    let instance = json!({
        "expressions": [{ "field": "age", "op": "!=", "value": 40 }],
        "operators": []
    });
    assert!(!compiled().is_valid(&instance));
    assert!(!schema_errors(&instance).unwrap().is_empty());
}

#[test]
fn non_numeric_value_is_rejected() {
    let instance = json!({
        "expressions": [{ "field": "age", "op": ">", "value": "forty" }]
    });
    let errors = schema_errors(&instance).unwrap();
    assert!(!errors.is_empty());
    assert!(FilterSpec::from_json_str(&instance.to_string()).is_err());
}

#[test]
fn unknown_connective_is_rejected() {
    let instance = json!({
        "expressions": [
            { "field": "age", "op": ">", "value": 40 },
            { "field": "human", "op": ">", "value": 0.9 }
        ],
        "operators": ["xor"]
    });
    assert!(!compiled().is_valid(&instance));
}
