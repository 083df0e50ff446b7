//! Environments & definitions (§4.1): the three persistent mappings every
//! evaluator threads through a reduction — `TypeEnv` (name → Type), `ValueEnv`
//! (name → Value), and `Defs` (`ns:name` → definition record).
//!
//! `ValueEnv` itself lives in `cairs_ir` (see that crate's `env` module doc
//! comment for why) and is re-exported here so callers only ever need to
//! depend on one of these two crates for "the environment types." `TypeEnv`
//! and `Defs` are built the same way: an `Arc`-linked chain of frames, so
//! `extend` never mutates a frame another binding (or closure) might still
//! be holding onto.

use cairs_ir::{AirDef, Type};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub use cairs_ir::ValueEnv;

#[derive(Debug)]
struct TypeFrame {
    bindings: FxHashMap<String, Type>,
    parent: Option<Arc<TypeFrame>>,
}

/// A persistent name → [`Type`] environment (Γ in the spec's notation).
#[derive(Clone, Debug)]
pub struct TypeEnv(Option<Arc<TypeFrame>>);

impl TypeEnv {
    #[must_use]
    pub fn empty() -> Self {
        TypeEnv(None)
    }

    #[must_use]
    pub fn extend(&self, name: impl Into<String>, ty: Type) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(name.into(), ty);
        TypeEnv(Some(Arc::new(TypeFrame { bindings, parent: self.0.clone() })))
    }

    #[must_use]
    pub fn extend_many(&self, values: impl IntoIterator<Item = (String, Type)>) -> Self {
        let bindings: FxHashMap<String, Type> = values.into_iter().collect();
        TypeEnv(Some(Arc::new(TypeFrame { bindings, parent: self.0.clone() })))
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Type> {
        let mut frame = self.0.as_ref();
        while let Some(f) = frame {
            if let Some(t) = f.bindings.get(name) {
                return Some(t.clone());
            }
            frame = f.parent.as_ref();
        }
        None
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::empty()
    }
}

/// The globally addressable definition table (`ns:name` → [`AirDef`]),
/// immutable on extension like the other two environments (§4.1).
#[derive(Clone, Debug, Default)]
pub struct Defs {
    table: Arc<FxHashMap<String, Arc<AirDef>>>,
}

impl Defs {
    #[must_use]
    pub fn empty() -> Self {
        Defs::default()
    }

    /// Register one definition, returning a new table. The receiver is
    /// unchanged.
    #[must_use]
    pub fn register_def(&self, def: AirDef) -> Self {
        let mut table = (*self.table).clone();
        table.insert(def.key(), Arc::new(def));
        Defs { table: Arc::new(table) }
    }

    /// Build a table from every `airDefs` entry of a document in one pass.
    #[must_use]
    pub fn from_air_defs(defs: impl IntoIterator<Item = AirDef>) -> Self {
        let mut table = FxHashMap::default();
        for def in defs {
            table.insert(def.key(), Arc::new(def));
        }
        Defs { table: Arc::new(table) }
    }

    #[must_use]
    pub fn lookup(&self, ns: &str, name: &str) -> Option<Arc<AirDef>> {
        self.table.get(&format!("{ns}:{name}")).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairs_ir::Expr;

    fn def(ns: &str, name: &str) -> AirDef {
        AirDef {
            ns: ns.to_string(),
            name: name.to_string(),
            params: vec![],
            result: Type::Int,
            body: Expr::Var { name: "x".into() },
        }
    }

    #[test]
    fn type_env_extend_does_not_mutate_parent() {
        let base = TypeEnv::empty().extend("x", Type::Int);
        let extended = base.extend("y", Type::Bool);
        assert!(base.lookup("y").is_none());
        assert_eq!(extended.lookup("x"), Some(Type::Int));
    }

    #[test]
    fn defs_register_is_immutable() {
        let empty = Defs::empty();
        let extended = empty.register_def(def("math", "square"));
        assert!(empty.lookup("math", "square").is_none());
        assert!(extended.lookup("math", "square").is_some());
    }

    #[test]
    fn defs_from_air_defs_builds_whole_table() {
        let defs = Defs::from_air_defs(vec![def("math", "square"), def("math", "cube")]);
        assert!(defs.lookup("math", "square").is_some());
        assert!(defs.lookup("math", "cube").is_some());
        assert!(defs.lookup("math", "missing").is_none());
    }
}
