//! The CAIRS type algebra (§3 DATA MODEL, Types).
//!
//! Types are a closed tagged sum with *structural* equality: two `Type`
//! values are equal iff their shapes are equal, recursively. `void` and
//! `ref` are only legal from EIR upward and `fn` only from CIR upward;
//! that legality check lives in `cairs_validate`, not here — this module
//! only knows how to represent and compare types.

use serde::{Deserialize, Serialize};

/// A CAIRS type.
///
/// JSON shape: an object tagged by `"kind"`. Scalars are `{"kind":"int"}`;
/// containers carry their element type(s) under `"of"` (list/set/option/ref),
/// `"key"`/`"value"` (map), or `"params"`/`"returns"` (fn); `opaque` carries
/// a `"name"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Type {
    Bool,
    Int,
    Float,
    String,
    Void,
    List {
        of: Box<Type>,
    },
    Set {
        of: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Option {
        of: Box<Type>,
    },
    Fn {
        params: Vec<Type>,
        returns: Box<Type>,
    },
    Ref {
        of: Box<Type>,
    },
    Opaque {
        name: String,
    },
}

impl Type {
    /// Human-readable name for diagnostics, e.g. `"list<int>"`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Type::Bool => "bool".to_string(),
            Type::Int => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::String => "string".to_string(),
            Type::Void => "void".to_string(),
            Type::List { of } => format!("list<{}>", of.describe()),
            Type::Set { of } => format!("set<{}>", of.describe()),
            Type::Map { key, value } => format!("map<{},{}>", key.describe(), value.describe()),
            Type::Option { of } => format!("option<{}>", of.describe()),
            Type::Fn { params, returns } => {
                let params = params.iter().map(Type::describe).collect::<Vec<_>>().join(", ");
                format!("fn({params})->{}", returns.describe())
            }
            Type::Ref { of } => format!("ref<{}>", of.describe()),
            Type::Opaque { name } => format!("opaque({name})"),
        }
    }

    /// `true` for `void` and `ref`, which are only legal from EIR upward.
    #[must_use]
    pub fn is_eir_only(&self) -> bool {
        matches!(self, Type::Void | Type::Ref { .. })
    }

    /// `true` for `fn`, which is only legal from CIR upward.
    #[must_use]
    pub fn is_cir_only(&self) -> bool {
        matches!(self, Type::Fn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        let a = Type::List { of: Box::new(Type::Int) };
        let b = Type::List { of: Box::new(Type::Int) };
        assert_eq!(a, b);
    }

    #[test]
    fn structural_inequality() {
        let a = Type::List { of: Box::new(Type::Int) };
        let b = Type::List { of: Box::new(Type::Float) };
        assert_ne!(a, b);
    }

    #[test]
    fn describe_nested() {
        let t = Type::Fn {
            params: vec![Type::Int, Type::String],
            returns: Box::new(Type::Bool),
        };
        assert_eq!(t.describe(), "fn(int, string)->bool");
    }

    #[test]
    fn deserialize_list_of_int() {
        let json = r#"{"kind":"list","of":{"kind":"int"}}"#;
        let t: Type = serde_json::from_str(json).expect("valid type json");
        assert_eq!(t, Type::List { of: Box::new(Type::Int) });
    }

    #[test]
    fn eir_and_cir_only_markers() {
        assert!(Type::Void.is_eir_only());
        assert!(Type::Ref { of: Box::new(Type::Int) }.is_eir_only());
        assert!(Type::Fn { params: vec![], returns: Box::new(Type::Void) }.is_cir_only());
        assert!(!Type::Int.is_eir_only());
        assert!(!Type::Int.is_cir_only());
    }
}
