//! Immutable-extend value environments (§4.1 ENVIRONMENTS, the `ValueEnv`
//! half; the definition-table half lives in `cairs_env`).
//!
//! `ValueEnv` lives in this crate rather than in `cairs_env` because
//! `Value::Closure` snapshots one at capture time (§4.6) — putting the type
//! anywhere that depends on `cairs_ir` rather than being depended *on* by it
//! would make the two crates circular. `cairs_env` re-exports this type and
//! builds the richer `TypeEnv`/`Defs` machinery around it.
//!
//! Extending an environment never mutates an existing frame: `extend`
//! allocates a new frame pointing at the old one via `Arc`, so a closure that
//! captured an outer `ValueEnv` is unaffected by bindings added after it was
//! built. This is what gives CAIRS closures snapshot isolation instead of the
//! live-scope-chain semantics of a mutable interpreter.

use crate::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug)]
struct Frame {
    bindings: FxHashMap<String, Value>,
    parent: Option<Arc<Frame>>,
}

/// A persistent, `Arc`-shared chain of binding frames.
#[derive(Clone, Debug)]
pub struct ValueEnv(Option<Arc<Frame>>);

impl ValueEnv {
    #[must_use]
    pub fn empty() -> Self {
        ValueEnv(None)
    }

    /// Push a single binding, returning a new environment. `self` is left
    /// untouched and usable (e.g. by a closure that already captured it).
    #[must_use]
    pub fn extend(&self, name: impl Into<String>, value: Value) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(name.into(), value);
        ValueEnv(Some(Arc::new(Frame { bindings, parent: self.0.clone() })))
    }

    /// Push several bindings as a single frame (one `fix`/lambda application).
    #[must_use]
    pub fn extend_many(&self, values: impl IntoIterator<Item = (String, Value)>) -> Self {
        let bindings: FxHashMap<String, Value> = values.into_iter().collect();
        ValueEnv(Some(Arc::new(Frame { bindings, parent: self.0.clone() })))
    }

    /// Look up a binding, walking outward from the innermost frame.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut frame = self.0.as_ref();
        while let Some(f) = frame {
            if let Some(v) = f.bindings.get(name) {
                return Some(v.clone());
            }
            frame = f.parent.as_ref();
        }
        None
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl Default for ValueEnv {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_innermost_binding() {
        let env = ValueEnv::empty().extend("x", Value::Int(1)).extend("x", Value::Int(2));
        assert_eq!(env.lookup("x"), Some(Value::Int(2)));
    }

    #[test]
    fn extend_does_not_mutate_parent() {
        let base = ValueEnv::empty().extend("x", Value::Int(1));
        let extended = base.extend("y", Value::Int(2));
        assert_eq!(base.lookup("y"), None);
        assert_eq!(extended.lookup("x"), Some(Value::Int(1)));
        assert_eq!(extended.lookup("y"), Some(Value::Int(2)));
    }

    #[test]
    fn unbound_name_is_none() {
        assert_eq!(ValueEnv::empty().lookup("missing"), None);
    }

    #[test]
    fn snapshot_isolation_for_captured_environments() {
        let outer = ValueEnv::empty().extend("x", Value::Int(1));
        let captured = outer.clone();
        let _later = outer.extend("x", Value::Int(99));
        assert_eq!(captured.lookup("x"), Some(Value::Int(1)));
    }
}
