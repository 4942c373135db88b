use anyhow::{Context, Result};
use clap::Parser;
use cohort_qc::query::spec::schema_errors;
use cohort_qc::query::FilterSpec;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::{fs, path::PathBuf};

/// Validate a filter spec JSON file against the filter spec v1 schema.
#[derive(Parser, Debug)]
#[command(name = "validate-filter", version, about = "Validate filter spec JSON against schema")]
struct Cli {
    /// Path to the filter spec JSON file to validate
    path: PathBuf,

    /// Optional schema file; the built-in filter spec v1 schema otherwise
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn load_json(path: &PathBuf) -> Result<Value> {
    let data = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value =
        serde_json::from_str(&data).with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    Ok(json)
}

fn validate_with(schema_path: &PathBuf, instance: &Value) -> Result<Vec<String>> {
    let schema_json = load_json(schema_path)?;
    // jsonschema 0.17 wants a 'static schema; it lives as long as the process anyway
    let schema_static: &'static Value = Box::leak(Box::new(schema_json));
    let compiled = JSONSchema::options()
        .compile(schema_static)
        .map_err(|e| anyhow::anyhow!("Failed to compile JSON Schema: {e}"))?;
    let errors = match compiled.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| format!("{} at {}", e, e.instance_path)).collect(),
    };
    Ok(errors)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let instance = load_json(&args.path)?;

    let errors = match &args.schema {
        Some(schema_path) => validate_with(schema_path, &instance)?,
        None => schema_errors(&instance)?,
    };

    if !errors.is_empty() {
        eprintln!("invalid:");
        for error in errors {
            eprintln!("- {error}");
        }
        std::process::exit(1)
    }

    // shape is fine; make sure it also reads as a spec
    let spec = FilterSpec::from_json_str(&instance.to_string())?;
    println!("valid ({} expressions)", spec.expressions.len());
    Ok(())
}
