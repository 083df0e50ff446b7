//! `--inputs` / `--inputs-file` parsing (§6 "External interfaces").
//!
//! Inputs arrive as untyped JSON scalars — the CLI has no document-level
//! type to check them against, so conversion to [`cairs_ir::Value`] happens
//! structurally, the same shape `cairs_eval::literal_to_value` uses for typed
//! literals but without a `Type` to key off of.

use anyhow::{bail, Context, Result};
use cairs_ir::Value;
use std::path::Path;

/// Parse `--inputs`'s raw argument: a JSON array (`[1,"x",2]`) or a
/// comma-separated scalar list (`1,2,3` / `a,b,c`), with numeric-looking
/// comma-form tokens coerced to numbers.
pub fn parse_inputs_arg(raw: &str) -> Result<Vec<Value>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        let items: Vec<serde_json::Value> = serde_json::from_str(trimmed).context("--inputs is not a valid JSON array")?;
        return Ok(items.iter().map(json_to_value).collect());
    }
    Ok(trimmed.split(',').map(str::trim).map(coerce_scalar).collect())
}

/// Read a JSON array of inputs from disk (`--inputs-file`).
pub fn parse_inputs_file(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading inputs file \"{}\"", path.display()))?;
    let items: Vec<serde_json::Value> =
        serde_json::from_str(&text).with_context(|| format!("\"{}\" is not a JSON array", path.display()))?;
    Ok(items.iter().map(json_to_value).collect())
}

fn coerce_scalar(token: &str) -> Value {
    if let Ok(i) = token.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::Float(f);
    }
    match token {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::string(token),
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Void,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => Value::list(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(_) => Value::error_with(cairs_ir::ErrorCode::InvalidTypeFormat, "nested objects are not a supported input shape"),
    }
}

/// Fail fast rather than silently accepting an empty `--inputs` value.
pub fn require_nonempty(inputs: &[Value], flag: &str) -> Result<()> {
    if inputs.is_empty() {
        bail!("{flag} parsed to zero inputs");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_form_coerces_numeric_tokens() {
        let inputs = parse_inputs_arg("1,2,3").unwrap();
        assert_eq!(inputs, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn comma_form_keeps_non_numeric_tokens_as_strings() {
        let inputs = parse_inputs_arg("a,b,c").unwrap();
        assert_eq!(inputs, vec![Value::string("a"), Value::string("b"), Value::string("c")]);
    }

    #[test]
    fn json_array_form_is_parsed_structurally() {
        let inputs = parse_inputs_arg(r#"[1,"x",2]"#).unwrap();
        assert_eq!(inputs, vec![Value::Int(1), Value::string("x"), Value::Int(2)]);
    }

    #[test]
    fn malformed_json_array_is_an_error() {
        assert!(parse_inputs_arg("[1,").is_err());
    }
}
