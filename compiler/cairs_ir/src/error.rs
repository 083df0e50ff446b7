//! The CAIRS error taxonomy (§4.2 ERROR MODEL, §7 ERROR HANDLING DESIGN).
//!
//! Errors are values, not exceptions: every evaluator returns a
//! `Value::Error` on failure rather than unwinding. `ErrorCode` is the
//! closed set from the spec; adding a new code is a breaking change to the
//! wire format, so it is *not* left open for extension the way the operator
//! and effect registries are.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of error codes CAIRS evaluators and validators may emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Runtime
    TypeError,
    ArityError,
    DomainError,
    DivideByZero,
    UnknownOperator,
    UnknownDefinition,
    UnboundIdentifier,
    // Termination
    NonTermination,
    // Async
    TimeoutError,
    SelectTimeout,
    // Validation
    ValidationError,
    MissingRequiredField,
    InvalidIdFormat,
    InvalidTypeFormat,
    InvalidExprFormat,
    DuplicateNodeId,
    InvalidResultReference,
    CyclicReference,
}

impl ErrorCode {
    /// The wire/display name, identical to the enum variant (e.g. `"DivideByZero"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::TypeError => "TypeError",
            ErrorCode::ArityError => "ArityError",
            ErrorCode::DomainError => "DomainError",
            ErrorCode::DivideByZero => "DivideByZero",
            ErrorCode::UnknownOperator => "UnknownOperator",
            ErrorCode::UnknownDefinition => "UnknownDefinition",
            ErrorCode::UnboundIdentifier => "UnboundIdentifier",
            ErrorCode::NonTermination => "NonTermination",
            ErrorCode::TimeoutError => "TimeoutError",
            ErrorCode::SelectTimeout => "SelectTimeout",
            ErrorCode::ValidationError => "ValidationError",
            ErrorCode::MissingRequiredField => "MissingRequiredField",
            ErrorCode::InvalidIdFormat => "InvalidIdFormat",
            ErrorCode::InvalidTypeFormat => "InvalidTypeFormat",
            ErrorCode::InvalidExprFormat => "InvalidExprFormat",
            ErrorCode::DuplicateNodeId => "DuplicateNodeId",
            ErrorCode::InvalidResultReference => "InvalidResultReference",
            ErrorCode::CyclicReference => "CyclicReference",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_variant_name() {
        assert_eq!(ErrorCode::DivideByZero.to_string(), "DivideByZero");
        assert_eq!(ErrorCode::UnboundIdentifier.as_str(), "UnboundIdentifier");
    }

    #[test]
    fn round_trips_through_json() {
        let code = ErrorCode::SelectTimeout;
        let json = serde_json::to_string(&code).expect("serializable");
        let back: ErrorCode = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(code, back);
    }
}
