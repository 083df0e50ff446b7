//! `set`: `union, intersect, difference, contains, subset, add, remove, size`
//! (§4.3). Membership uses the value-hashing scheme of §3.

use crate::operator::{Operator, OperatorRegistry};
use cairs_ir::{value_hash, ErrorCode, Type, Value};

fn generic_set() -> Type {
    Type::Set { of: Box::new(Type::Opaque { name: "T".to_string() }) }
}

fn as_set(v: &Value) -> Option<&[(String, Value)]> {
    match v {
        Value::Set(items) => Some(items.as_slice()),
        _ => None,
    }
}

fn type_error(op: &str, args: &[Value]) -> Value {
    let kinds: Vec<&str> = args.iter().map(Value::kind_name).collect();
    Value::error_with(ErrorCode::TypeError, format!("{op} does not accept ({})", kinds.join(", ")))
}

fn from_pairs(pairs: Vec<(String, Value)>) -> Value {
    Value::set(pairs.into_iter().map(|(_, v)| v).collect())
}

#[must_use]
pub fn registry() -> OperatorRegistry {
    let mut r = OperatorRegistry::empty();

    r.register(Operator::new("set", "union", vec![generic_set(), generic_set()], generic_set(), true, |a| {
        match (as_set(&a[0]), as_set(&a[1])) {
            (Some(x), Some(y)) => {
                let mut out = x.to_vec();
                for (h, v) in y {
                    if !out.iter().any(|(eh, _)| eh == h) {
                        out.push((h.clone(), v.clone()));
                    }
                }
                from_pairs(out)
            }
            _ => type_error("set:union", a),
        }
    }));

    r.register(Operator::new("set", "intersect", vec![generic_set(), generic_set()], generic_set(), true, |a| {
        match (as_set(&a[0]), as_set(&a[1])) {
            (Some(x), Some(y)) => {
                let out: Vec<(String, Value)> =
                    x.iter().filter(|(h, _)| y.iter().any(|(eh, _)| eh == h)).cloned().collect();
                from_pairs(out)
            }
            _ => type_error("set:intersect", a),
        }
    }));

    r.register(Operator::new("set", "difference", vec![generic_set(), generic_set()], generic_set(), true, |a| {
        match (as_set(&a[0]), as_set(&a[1])) {
            (Some(x), Some(y)) => {
                let out: Vec<(String, Value)> =
                    x.iter().filter(|(h, _)| !y.iter().any(|(eh, _)| eh == h)).cloned().collect();
                from_pairs(out)
            }
            _ => type_error("set:difference", a),
        }
    }));

    r.register(Operator::new("set", "contains", vec![generic_set(), Type::Opaque { name: "T".to_string() }], Type::Bool, true, |a| {
        match as_set(&a[0]) {
            Some(items) => {
                let h = value_hash(&a[1]);
                Value::Bool(items.iter().any(|(eh, _)| *eh == h))
            }
            None => type_error("set:contains", a),
        }
    }));

    r.register(Operator::new("set", "subset", vec![generic_set(), generic_set()], Type::Bool, true, |a| {
        match (as_set(&a[0]), as_set(&a[1])) {
            (Some(x), Some(y)) => {
                Value::Bool(x.iter().all(|(h, _)| y.iter().any(|(eh, _)| eh == h)))
            }
            _ => type_error("set:subset", a),
        }
    }));

    r.register(Operator::new("set", "add", vec![generic_set(), Type::Opaque { name: "T".to_string() }], generic_set(), true, |a| {
        match as_set(&a[0]) {
            Some(items) => {
                let h = value_hash(&a[1]);
                let mut out = items.to_vec();
                if !out.iter().any(|(eh, _)| *eh == h) {
                    out.push((h, a[1].clone()));
                }
                from_pairs(out)
            }
            None => type_error("set:add", a),
        }
    }));

    r.register(Operator::new("set", "remove", vec![generic_set(), Type::Opaque { name: "T".to_string() }], generic_set(), true, |a| {
        match as_set(&a[0]) {
            Some(items) => {
                let h = value_hash(&a[1]);
                let out: Vec<(String, Value)> = items.iter().filter(|(eh, _)| *eh != h).cloned().collect();
                from_pairs(out)
            }
            None => type_error("set:remove", a),
        }
    }));

    r.register(Operator::new("set", "size", vec![generic_set()], Type::Int, true, |a| match as_set(&a[0]) {
        Some(items) => Value::Int(items.len() as i64),
        None => type_error("set:size", a),
    }));

    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(ints: &[i64]) -> Value {
        Value::set(ints.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn union_intersect_difference_of_self_are_idempotent() {
        let r = registry();
        let a = set_of(&[1, 2, 3]);

        let union = r.get("set", "union").expect("registered").call(&[a.clone(), a.clone()]);
        assert_eq!(union, a);

        let intersect = r.get("set", "intersect").expect("registered").call(&[a.clone(), a.clone()]);
        assert_eq!(intersect, a);

        let difference = r.get("set", "difference").expect("registered").call(&[a.clone(), a.clone()]);
        assert_eq!(difference, set_of(&[]));
    }

    #[test]
    fn contains_and_size() {
        let r = registry();
        let a = set_of(&[1, 2, 3]);
        assert_eq!(
            r.get("set", "contains").expect("registered").call(&[a.clone(), Value::Int(2)]),
            Value::Bool(true)
        );
        assert_eq!(r.get("set", "size").expect("registered").call(&[a]), Value::Int(3));
    }

    #[test]
    fn add_dedupes_and_remove_is_by_hash() {
        let r = registry();
        let a = set_of(&[1, 2]);
        let added = r.get("set", "add").expect("registered").call(&[a.clone(), Value::Int(2)]);
        assert_eq!(added, a);
        let removed = r.get("set", "remove").expect("registered").call(&[a, Value::Int(1)]);
        assert_eq!(removed, set_of(&[2]));
    }
}
