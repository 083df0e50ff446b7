//! The four required operator domains (§4.3).

pub mod bool_domain;
pub mod core;
pub mod list_domain;
pub mod set_domain;

use crate::operator::OperatorRegistry;

/// All four domains merged into one registry — the registry an evaluator
/// gets when the caller doesn't supply custom operators.
#[must_use]
pub fn standard() -> OperatorRegistry {
    core::registry()
        .merge(&bool_domain::registry())
        .merge(&list_domain::registry())
        .merge(&set_domain::registry())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_all_domains() {
        let r = standard();
        assert!(r.get("core", "add").is_some());
        assert!(r.get("bool", "and").is_some());
        assert!(r.get("list", "length").is_some());
        assert!(r.get("set", "union").is_some());
    }
}
