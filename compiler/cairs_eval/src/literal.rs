//! Converting a `lit{type, value}` node's JSON payload into a [`Value`]
//! (§3 DATA MODEL, §4.6 `lit`).

use cairs_ir::{ErrorCode, Type, Value};

#[must_use]
pub fn literal_to_value(ty: &Type, value: &serde_json::Value) -> Value {
    match (ty, value) {
        (Type::Bool, serde_json::Value::Bool(b)) => Value::Bool(*b),
        (Type::Int, serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::error_with(ErrorCode::InvalidTypeFormat, "int literal out of range"),
        },
        (Type::Float, serde_json::Value::Number(n)) => match n.as_f64() {
            Some(f) => Value::Float(f),
            None => Value::error_with(ErrorCode::InvalidTypeFormat, "float literal unparseable"),
        },
        (Type::String, serde_json::Value::String(s)) => Value::string(s.clone()),
        (Type::Void, serde_json::Value::Null) => Value::Void,
        (Type::Option { .. }, serde_json::Value::Null) => Value::None,
        (Type::Option { of }, inner) => Value::some(literal_to_value(of, inner)),
        (Type::List { of }, serde_json::Value::Array(items)) => {
            Value::list(items.iter().map(|v| literal_to_value(of, v)).collect())
        }
        _ => Value::error_with(
            ErrorCode::InvalidTypeFormat,
            format!("literal value does not match declared type {}", ty.describe()),
        ),
    }
}
