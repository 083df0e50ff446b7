//! The operator registry (§4.3): `{ns, name, params, returns, pure, impl}`,
//! keyed by `ns:name`. Merging two registries is pointwise (later
//! registration wins on key collision).

use cairs_ir::{ErrorCode, Type, Value};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// The operator's implementation: a pure function over already-evaluated
/// argument values. Operators MUST NOT throw (§4.3) — failures are
/// `Value::error(..)` returns.
pub type OpImpl = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct Operator {
    pub ns: String,
    pub name: String,
    pub params: Vec<Type>,
    pub returns: Type,
    pub pure: bool,
    pub imp: OpImpl,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("ns", &self.ns)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("pure", &self.pure)
            .finish_non_exhaustive()
    }
}

impl Operator {
    pub fn new(
        ns: impl Into<String>,
        name: impl Into<String>,
        params: Vec<Type>,
        returns: Type,
        pure: bool,
        imp: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Operator { ns: ns.into(), name: name.into(), params, returns, pure, imp: Arc::new(imp) }
    }

    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.ns, self.name)
    }

    /// Invoke the operator: arity-check, then short-circuit on any error
    /// argument (§4.2 "any operator receiving an error argument returns the
    /// argument unchanged"), then dispatch to `imp`.
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Value {
        if let Some(err) = args.iter().find(|v| v.is_error()) {
            return (*err).clone();
        }
        if args.len() != self.params.len() {
            return Value::error_with(
                ErrorCode::ArityError,
                format!(
                    "{} expects {} argument(s), got {}",
                    self.key(),
                    self.params.len(),
                    args.len()
                ),
            );
        }
        (self.imp)(args)
    }
}

/// `ns:name → Operator`. Cheaply cloneable: cloning shares the underlying
/// table via `Arc`.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    table: FxHashMap<String, Operator>,
}

impl OperatorRegistry {
    #[must_use]
    pub fn empty() -> Self {
        OperatorRegistry::default()
    }

    pub fn register(&mut self, op: Operator) -> &mut Self {
        self.table.insert(op.key(), op);
        self
    }

    #[must_use]
    pub fn get(&self, ns: &str, name: &str) -> Option<&Operator> {
        self.table.get(&format!("{ns}:{name}"))
    }

    /// Pointwise merge: entries from `other` override entries of the same
    /// key in `self`.
    #[must_use]
    pub fn merge(&self, other: &OperatorRegistry) -> OperatorRegistry {
        let mut table = self.table.clone();
        table.extend(other.table.iter().map(|(k, v)| (k.clone(), v.clone())));
        OperatorRegistry { table }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_mismatch_is_arity_error() {
        let op = Operator::new("core", "neg", vec![Type::Int], Type::Int, true, |args| {
            Value::Int(-match args[0] {
                Value::Int(n) => n,
                _ => 0,
            })
        });
        let result = op.call(&[]);
        assert!(matches!(result, Value::Error(e) if e.code == ErrorCode::ArityError));
    }

    #[test]
    fn error_argument_short_circuits() {
        let op = Operator::new("core", "id", vec![Type::Int], Type::Int, true, |args| {
            args[0].clone()
        });
        let err = Value::error(ErrorCode::DivideByZero);
        let result = op.call(&[err.clone()]);
        assert_eq!(result, err);
    }

    #[test]
    fn merge_is_pointwise_with_override() {
        let mut a = OperatorRegistry::empty();
        a.register(Operator::new("core", "add", vec![], Type::Int, true, |_| Value::Int(1)));
        let mut b = OperatorRegistry::empty();
        b.register(Operator::new("core", "add", vec![], Type::Int, true, |_| Value::Int(2)));
        let merged = a.merge(&b);
        assert_eq!(merged.get("core", "add").expect("present").call(&[]), Value::Int(2));
    }
}
