//! `core`: arithmetic and comparison, polymorphic over `int`/`float` (§4.3).

use crate::operator::{Operator, OperatorRegistry};
use cairs_ir::{ErrorCode, Type, Value};

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn type_error(op: &str, args: &[Value]) -> Value {
    let kinds: Vec<&str> = args.iter().map(Value::kind_name).collect();
    Value::error_with(ErrorCode::TypeError, format!("{op} does not accept ({})", kinds.join(", ")))
}

/// `add`/`sub`/`mul`: both-`int` stays `int`; any `float` operand promotes
/// both to `float`.
fn arith(op: &str, args: &[Value], int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64) -> Value {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Value::Int(int_op(*a, *b)),
        (a, b) => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => Value::Float(float_op(x, y)),
            _ => type_error(op, args),
        },
    }
}

fn cmp_numeric(op: &str, args: &[Value], pred: fn(f64, f64) -> bool) -> Value {
    match (as_f64(&args[0]), as_f64(&args[1])) {
        (Some(x), Some(y)) => Value::Bool(pred(x, y)),
        _ => type_error(op, args),
    }
}

#[must_use]
pub fn registry() -> OperatorRegistry {
    let mut r = OperatorRegistry::empty();

    r.register(Operator::new("core", "add", vec![Type::Int, Type::Int], Type::Int, true, |a| {
        arith("core:add", a, |x, y| x.wrapping_add(y), |x, y| x + y)
    }));
    r.register(Operator::new("core", "sub", vec![Type::Int, Type::Int], Type::Int, true, |a| {
        arith("core:sub", a, |x, y| x.wrapping_sub(y), |x, y| x - y)
    }));
    r.register(Operator::new("core", "mul", vec![Type::Int, Type::Int], Type::Int, true, |a| {
        arith("core:mul", a, |x, y| x.wrapping_mul(y), |x, y| x * y)
    }));

    r.register(Operator::new("core", "div", vec![Type::Int, Type::Int], Type::Int, true, |a| {
        match (&a[0], &a[1]) {
            (Value::Int(_), Value::Int(0)) => Value::error(ErrorCode::DivideByZero),
            (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_div(*y)),
            (x, y) => match (as_f64(x), as_f64(y)) {
                (Some(_), Some(d)) if d == 0.0 => Value::error(ErrorCode::DivideByZero),
                (Some(n), Some(d)) => Value::Float(n / d),
                _ => type_error("core:div", a),
            },
        }
    }));

    r.register(Operator::new("core", "mod", vec![Type::Int, Type::Int], Type::Int, true, |a| {
        match (&a[0], &a[1]) {
            (Value::Int(_), Value::Int(0)) => Value::error(ErrorCode::DivideByZero),
            (Value::Int(x), Value::Int(y)) => Value::Int(x % y),
            _ => type_error("core:mod", a),
        }
    }));

    r.register(Operator::new("core", "pow", vec![Type::Int, Type::Int], Type::Int, true, |a| {
        match (&a[0], &a[1]) {
            (Value::Int(base), Value::Int(exp)) if *exp >= 0 => {
                Value::Int(base.wrapping_pow(*exp as u32))
            }
            (x, y) => match (as_f64(x), as_f64(y)) {
                (Some(base), Some(exp)) => Value::Float(base.powf(exp)),
                _ => type_error("core:pow", a),
            },
        }
    }));

    r.register(Operator::new("core", "neg", vec![Type::Int], Type::Int, true, |a| match &a[0] {
        Value::Int(n) => Value::Int(-n),
        Value::Float(f) => Value::Float(-f),
        _ => type_error("core:neg", a),
    }));

    r.register(Operator::new("core", "eq", vec![Type::Int, Type::Int], Type::Bool, true, |a| {
        Value::Bool(structural_eq(&a[0], &a[1]))
    }));
    r.register(Operator::new("core", "neq", vec![Type::Int, Type::Int], Type::Bool, true, |a| {
        Value::Bool(!structural_eq(&a[0], &a[1]))
    }));

    r.register(Operator::new("core", "lt", vec![Type::Int, Type::Int], Type::Bool, true, |a| {
        cmp_numeric("core:lt", a, |x, y| x < y)
    }));
    r.register(Operator::new("core", "lte", vec![Type::Int, Type::Int], Type::Bool, true, |a| {
        cmp_numeric("core:lte", a, |x, y| x <= y)
    }));
    r.register(Operator::new("core", "gt", vec![Type::Int, Type::Int], Type::Bool, true, |a| {
        cmp_numeric("core:gt", a, |x, y| x > y)
    }));
    r.register(Operator::new("core", "gte", vec![Type::Int, Type::Int], Type::Bool, true, |a| {
        cmp_numeric("core:gte", a, |x, y| x >= y)
    }));

    r
}

/// `eq`/`neq` compare int/int, float/float, string/string structurally;
/// mixed numeric pairs compare as floats (§4.3).
fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => **x == **y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}
