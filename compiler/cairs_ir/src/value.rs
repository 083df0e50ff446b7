//! Runtime values for the CAIRS evaluators (§3 DATA MODEL, Values).
//!
//! # Heap enforcement
//!
//! Every heap-allocated variant wraps an `Arc`, never a bare `Box` or `Rc`:
//! closures and ref cells are shared across `spawn`ed tasks in the PIR
//! evaluator, so `Value` must be `Send + Sync` end to end. `Heap<T>` is the
//! only way to get an `Arc` into a `Value` — its constructor is crate-private,
//! so the factory methods below (`Value::list`, `Value::string`, ...) are the
//! sole construction path.

use crate::env::ValueEnv;
use crate::error::ErrorCode;
use std::fmt;
use std::sync::Arc;

/// Enforced-Arc wrapper. See module docs.
#[derive(Clone)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> std::ops::Deref for Heap<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized> Heap<T> {
    /// Pointer identity, used as the fallback hash for compound values (§3).
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

/// A closure value: parameter names, a reference to its body node, and an
/// immutable snapshot of the environment it closed over (§4.6, CIR `lambda`).
///
/// `fix_of` is `None` for an ordinary `lambda`-built closure. A closure built
/// by `fix` instead carries the *original* one-parameter closure it wraps;
/// applying it re-derives the self-reference at call time (binds the
/// wrapper's own parameter name to itself, evaluates the wrapped closure's
/// body to get the "real" function, then applies that to the actual
/// arguments) rather than trying to build a literally self-referential
/// `ValueEnv`, which an immutable-extend environment cannot represent (§9).
#[derive(Debug)]
pub struct ClosureValue {
    pub params: Vec<String>,
    pub body: String,
    pub captured: ValueEnv,
    pub fix_of: Option<Heap<ClosureValue>>,
}

/// The "pending" marker carried by a freshly spawned task's future value
/// (§4.10). The scheduler, not this struct, tracks live completion status;
/// this is a snapshot of the value's shape at creation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FutureValue {
    pub task_id: String,
}

/// An opaque handle to a PIR channel. The channel's actual buffer, waiters,
/// and closed-ness live in the async evaluator's channel store (§4.8,
/// `cairs_async::ChannelStore`), keyed by `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub id: u64,
}

/// A first-class error value (§4.2, §7). Errors are values, not exceptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
    pub code: ErrorCode,
    pub message: Option<String>,
    pub meta: Option<Vec<(String, String)>>,
}

impl ErrorValue {
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        ErrorValue { code, message: None, meta: None }
    }

    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorValue { code, message: Some(message.into()), meta: None }
    }
}

/// A runtime value shared by every CAIRS IR layer.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Heap<String>),
    Void,
    List(Heap<Vec<Value>>),
    /// Unordered, deduplicated by value hash. Stored as `(hash, value)` pairs
    /// so membership checks don't recompute the hash.
    Set(Heap<Vec<(String, Value)>>),
    /// Insertion-order-irrelevant association, stored as `(key_hash, key, value)`.
    Map(Heap<Vec<(String, Value, Value)>>),
    Some(Heap<Value>),
    None,
    Closure(Heap<ClosureValue>),
    /// A mutable single-value cell (EIR `refCell`/`deref`/`assignRef`).
    RefCell(Heap<parking_lot::Mutex<Value>>),
    Channel(ChannelHandle),
    Future(FutureValue),
    Error(Heap<ErrorValue>),
}

impl Value {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    #[must_use]
    pub fn closure(params: Vec<String>, body: impl Into<String>, captured: ValueEnv) -> Self {
        Value::Closure(Heap::new(ClosureValue {
            params,
            body: body.into(),
            captured,
            fix_of: None,
        }))
    }

    /// Build the closure `fix` produces from a one-parameter closure `f`:
    /// applying the result to `x` evaluates to `f(g)(x)` (§4.6, §9).
    #[must_use]
    pub fn fix_closure(f: Heap<ClosureValue>) -> Self {
        Value::Closure(Heap::new(ClosureValue {
            params: f.params.clone(),
            body: f.body.clone(),
            captured: f.captured.clone(),
            fix_of: Some(f),
        }))
    }

    #[must_use]
    pub fn ref_cell(initial: Value) -> Self {
        Value::RefCell(Heap::new(parking_lot::Mutex::new(initial)))
    }

    #[must_use]
    pub fn some(v: Value) -> Self {
        Value::Some(Heap::new(v))
    }

    #[must_use]
    pub fn error(code: ErrorCode) -> Self {
        Value::Error(Heap::new(ErrorValue::new(code)))
    }

    #[must_use]
    pub fn error_with(code: ErrorCode, message: impl Into<String>) -> Self {
        Value::Error(Heap::new(ErrorValue::with_message(code, message)))
    }

    /// Build a `set<T>` from elements, deduplicating by value hash and
    /// preserving first-seen order (§3, §4.4 `set` domain).
    #[must_use]
    pub fn set(elements: Vec<Value>) -> Self {
        let mut out: Vec<(String, Value)> = Vec::with_capacity(elements.len());
        for v in elements {
            let h = value_hash(&v);
            if !out.iter().any(|(existing, _)| existing == &h) {
                out.push((h, v));
            }
        }
        Value::Set(Heap::new(out))
    }

    /// Build a `map<K,V>` from pairs, keeping the first value seen for a
    /// repeated key.
    #[must_use]
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        let mut out: Vec<(String, Value, Value)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let h = value_hash(&k);
            if !out.iter().any(|(existing, _, _)| existing == &h) {
                out.push((h, k, v));
            }
        }
        Value::Map(Heap::new(out))
    }

    /// `true` if this value is the error carrier (used for short-circuit
    /// propagation, §4.2).
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The runtime type tag name, for `TypeError` messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Void => "void",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Some(_) | Value::None => "option",
            Value::Closure(_) => "fn",
            Value::RefCell(_) => "ref",
            Value::Channel(_) => "channel",
            Value::Future(_) => "future",
            Value::Error(_) => "error",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Void, Value::Void) | (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => **a == **b,
            (Value::Some(a), Value::Some(b)) => **a == **b,
            // Sets/maps are unordered (§3): compare by hash-key membership,
            // not positionally, so insertion order never affects equality.
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|(h, _)| b.iter().any(|(h2, _)| h2 == h))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(h, _, v)| b.iter().any(|(h2, _, v2)| h2 == h && v2 == v))
            }
            (Value::Channel(a), Value::Channel(b)) => a == b,
            (Value::Future(a), Value::Future(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => **a == **b,
            // Closures and ref cells compare by identity only.
            (Value::Closure(a), Value::Closure(b)) => a.identity() == b.identity(),
            (Value::RefCell(a), Value::RefCell(b)) => a.identity() == b.identity(),
            _ => false,
        }
    }
}

/// Hash a value to a prefixed string per §3's value-hashing rules.
///
/// Primitives hash to their textual form; compound values (list/set/map/
/// closure/ref cell) have no stable content hash and fall back to a fresh
/// identity (their heap pointer), so two separately-constructed but
/// syntactically identical compound values hash differently and therefore
/// count as two entries in a set or map.
#[must_use]
pub fn value_hash(v: &Value) -> String {
    match v {
        Value::Int(n) => format!("i:{n}"),
        Value::Float(f) => format!("f:{:016x}", f.to_bits()),
        Value::Str(s) => format!("s:{s}"),
        Value::Bool(b) => format!("b:{b}"),
        Value::Void => "v:void".to_string(),
        Value::None => "o:none".to_string(),
        Value::Some(inner) => format!("o:some:{}", value_hash(inner)),
        Value::List(h) => format!("id:{:x}", h.identity()),
        Value::Set(h) => format!("id:{:x}", h.identity()),
        Value::Map(h) => format!("id:{:x}", h.identity()),
        Value::Closure(h) => format!("id:{:x}", h.identity()),
        Value::RefCell(h) => format!("id:{:x}", h.identity()),
        Value::Channel(c) => format!("id:ch{}", c.id),
        Value::Future(fut) => format!("id:fut:{}", fut.task_id),
        Value::Error(h) => format!("id:{:x}", h.identity()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_hash_is_pure_of_value() {
        assert_eq!(value_hash(&Value::Int(42)), value_hash(&Value::Int(42)));
        assert_eq!(value_hash(&Value::string("x")), value_hash(&Value::string("x")));
        assert_eq!(value_hash(&Value::Bool(true)), "b:true");
    }

    #[test]
    fn compound_values_hash_by_identity() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = Value::list(vec![Value::Int(1)]);
        assert_ne!(value_hash(&a), value_hash(&b));
    }

    #[test]
    fn set_dedupes_primitives_but_not_compounds() {
        let s = Value::set(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        let Value::Set(items) = &s else { panic!("expected set") };
        assert_eq!(items.len(), 2);

        let l1 = Value::list(vec![Value::Int(1)]);
        let l2 = Value::list(vec![Value::Int(1)]);
        let s2 = Value::set(vec![l1, l2]);
        let Value::Set(items2) = &s2 else { panic!("expected set") };
        assert_eq!(items2.len(), 2, "identical compound values are distinct set entries");
    }

    #[test]
    fn error_short_circuit_marker() {
        assert!(Value::error(ErrorCode::DivideByZero).is_error());
        assert!(!Value::Int(1).is_error());
    }

    #[test]
    fn sets_built_in_different_insertion_order_are_equal() {
        let a = Value::set(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let b = Value::set(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn sets_of_different_size_are_never_equal() {
        let a = Value::set(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::set(vec![Value::Int(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn maps_built_in_different_insertion_order_are_equal() {
        let a = Value::map(vec![(Value::string("x"), Value::Int(1)), (Value::string("y"), Value::Int(2))]);
        let b = Value::map(vec![(Value::string("y"), Value::Int(2)), (Value::string("x"), Value::Int(1))]);
        assert_eq!(a, b);
    }

    #[test]
    fn maps_with_same_keys_but_different_values_are_not_equal() {
        let a = Value::map(vec![(Value::string("x"), Value::Int(1))]);
        let b = Value::map(vec![(Value::string("x"), Value::Int(2))]);
        assert_ne!(a, b);
    }

    #[test]
    fn closure_equality_is_identity_not_structural() {
        let env = ValueEnv::empty();
        let c1 = Value::closure(vec!["x".into()], "body".to_string(), env.clone());
        let c2 = Value::closure(vec!["x".into()], "body".to_string(), env);
        assert_ne!(c1, c2, "two freshly built closures are distinct identities");
        assert_eq!(c1, c1.clone(), "cloning preserves identity");
    }

    #[test]
    fn fix_closure_wraps_the_original() {
        let env = ValueEnv::empty();
        let f = match Value::closure(vec!["self".into()], "inner".to_string(), env) {
            Value::Closure(h) => h,
            _ => unreachable!(),
        };
        let g = Value::fix_closure(f);
        match g {
            Value::Closure(h) => assert!(h.fix_of.is_some()),
            _ => panic!("expected closure"),
        }
    }
}
