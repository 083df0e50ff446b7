//! `list`: `length, concat, nth, reverse, slice, cons` (§4.3).

use crate::operator::{Operator, OperatorRegistry};
use cairs_ir::{ErrorCode, Type, Value};

fn generic_list() -> Type {
    Type::List { of: Box::new(Type::Opaque { name: "T".to_string() }) }
}

fn as_list(v: &Value) -> Option<&[Value]> {
    match v {
        Value::List(items) => Some(items.as_slice()),
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

    r.register(Operator::new("list", "length", vec![generic_list()], Type::Int, true, |a| {
        match as_list(&a[0]) {
            Some(items) => Value::Int(items.len() as i64),
            None => type_error("list:length", a),
        }
    }));

    r.register(Operator::new(
        "list",
        "concat",
        vec![generic_list(), generic_list()],
        generic_list(),
        true,
        |a| match (as_list(&a[0]), as_list(&a[1])) {
            (Some(x), Some(y)) => {
                let mut out = Vec::with_capacity(x.len() + y.len());
                out.extend_from_slice(x);
                out.extend_from_slice(y);
                Value::list(out)
            }
            _ => type_error("list:concat", a),
        },
    ));

    r.register(Operator::new("list", "nth", vec![generic_list(), Type::Int], Type::Opaque { name: "T".to_string() }, true, |a| {
        match (as_list(&a[0]), &a[1]) {
            (Some(items), Value::Int(i)) => {
                if *i < 0 || *i as usize >= items.len() {
                    Value::error_with(ErrorCode::DomainError, format!("index {i} out of range"))
                } else {
                    items[*i as usize].clone()
                }
            }
            _ => type_error("list:nth", a),
        }
    }));

    r.register(Operator::new("list", "reverse", vec![generic_list()], generic_list(), true, |a| {
        match as_list(&a[0]) {
            Some(items) => {
                let mut out = items.to_vec();
                out.reverse();
                Value::list(out)
            }
            None => type_error("list:reverse", a),
        }
    }));

    // slice(list, start): elements from `start` to the end, like a Python
    // `list[start:]`. Out-of-range `start` clamps to an empty result rather
    // than erroring, matching `nth`'s separate in-bounds check being the only
    // place the spec calls out a `DomainError`.
    r.register(Operator::new("list", "slice", vec![generic_list(), Type::Int], generic_list(), true, |a| {
        match (as_list(&a[0]), &a[1]) {
            (Some(items), Value::Int(start)) => {
                let start = (*start).max(0) as usize;
                Value::list(items.get(start..).unwrap_or(&[]).to_vec())
            }
            _ => type_error("list:slice", a),
        }
    }));

    r.register(Operator::new(
        "list",
        "cons",
        vec![Type::Opaque { name: "T".to_string() }, generic_list()],
        generic_list(),
        true,
        |a| match as_list(&a[1]) {
            Some(items) => {
                let mut out = Vec::with_capacity(items.len() + 1);
                out.push(a[0].clone());
                out.extend_from_slice(items);
                Value::list(out)
            }
            None => type_error("list:cons", a),
        },
    ));

    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_out_of_range_is_domain_error() {
        let r = registry();
        let list = Value::list(vec![Value::Int(1)]);
        let result = r.get("list", "nth").expect("registered").call(&[list, Value::Int(5)]);
        assert!(matches!(result, Value::Error(e) if e.code == ErrorCode::DomainError));
    }

    #[test]
    fn reverse_is_involutive() {
        let r = registry();
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let once = r.get("list", "reverse").expect("registered").call(&[list.clone()]);
        let twice = r.get("list", "reverse").expect("registered").call(&[once]);
        assert_eq!(twice, list);
    }

    #[test]
    fn concat_with_empty_is_identity() {
        let r = registry();
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let empty = Value::list(vec![]);
        let result = r.get("list", "concat").expect("registered").call(&[list.clone(), empty]);
        assert_eq!(result, list);
    }

    #[test]
    fn cons_prepends() {
        let r = registry();
        let list = Value::list(vec![Value::Int(2), Value::Int(3)]);
        let result = r.get("list", "cons").expect("registered").call(&[Value::Int(1), list]);
        assert_eq!(result, Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }
}
