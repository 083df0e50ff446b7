//! `bool`: `and, or, xor, not` (§4.3). Both arguments are evaluated strictly
//! before the operator is applied — there is no lazy short-circuiting at the
//! operator layer (that would require deferring evaluation of an argument
//! node, which only `if` does).

use crate::operator::{Operator, OperatorRegistry};
use cairs_ir::{ErrorCode, Type, Value};

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn type_error(op: &str, args: &[Value]) -> Value {
    let kinds: Vec<&str> = args.iter().map(Value::kind_name).collect();
    Value::error_with(ErrorCode::TypeError, format!("{op} does not accept ({})", kinds.join(", ")))
}

#[must_use]
pub fn registry() -> OperatorRegistry {
    let mut r = OperatorRegistry::empty();

    r.register(Operator::new("bool", "and", vec![Type::Bool, Type::Bool], Type::Bool, true, |a| {
        match (as_bool(&a[0]), as_bool(&a[1])) {
            (Some(x), Some(y)) => Value::Bool(x && y),
            _ => type_error("bool:and", a),
        }
    }));
    r.register(Operator::new("bool", "or", vec![Type::Bool, Type::Bool], Type::Bool, true, |a| {
        match (as_bool(&a[0]), as_bool(&a[1])) {
            (Some(x), Some(y)) => Value::Bool(x || y),
            _ => type_error("bool:or", a),
        }
    }));
    r.register(Operator::new("bool", "xor", vec![Type::Bool, Type::Bool], Type::Bool, true, |a| {
        match (as_bool(&a[0]), as_bool(&a[1])) {
            (Some(x), Some(y)) => Value::Bool(x ^ y),
            _ => type_error("bool:xor", a),
        }
    }));
    r.register(Operator::new("bool", "not", vec![Type::Bool], Type::Bool, true, |a| {
        match as_bool(&a[0]) {
            Some(x) => Value::Bool(!x),
            None => type_error("bool:not", a),
        }
    }));

    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_or_xor_not() {
        let r = registry();
        assert_eq!(
            r.get("bool", "and").expect("registered").call(&[Value::Bool(true), Value::Bool(false)]),
            Value::Bool(false)
        );
        assert_eq!(
            r.get("bool", "or").expect("registered").call(&[Value::Bool(true), Value::Bool(false)]),
            Value::Bool(true)
        );
        assert_eq!(
            r.get("bool", "xor").expect("registered").call(&[Value::Bool(true), Value::Bool(true)]),
            Value::Bool(false)
        );
        assert_eq!(r.get("bool", "not").expect("registered").call(&[Value::Bool(true)]), Value::Bool(false));
    }

    #[test]
    fn non_bool_argument_is_type_error() {
        let r = registry();
        let result = r.get("bool", "not").expect("registered").call(&[Value::Int(1)]);
        assert!(matches!(result, Value::Error(e) if e.code == ErrorCode::TypeError));
    }
}
