//! Validator-facing diagnostic records.
//!
//! CAIRS documents carry no source spans — nodes are JSON objects keyed by
//! id, not text ranges — so a diagnostic here locates a problem by a
//! dotted/bracketed *path* into the document (`"nodes[2].expr.args[0]"`)
//! rather than by byte offset. Everything else about the shape (a structured
//! record with a machine-checkable code plus a human message, collected
//! rather than thrown) follows the same discipline as a source-span
//! diagnostic would.

use cairs_ir::ErrorCode;
use std::fmt;

/// A single validator finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub code: ErrorCode,
    pub path: String,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Issue { code, path: path.into(), message: message.into() }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.path, self.message)
    }
}

/// The outcome of one validator pass (§4.5): a list of every issue found
/// plus a derived `valid` flag. Validation never stops at the first error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub issues: Vec<Issue>,
}

impl Report {
    #[must_use]
    pub fn empty() -> Self {
        Report::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Report) {
        self.issues.extend(other.issues);
    }

    #[must_use]
    pub fn valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl FromIterator<Issue> for Report {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Report { issues: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_valid() {
        assert!(Report::empty().valid());
    }

    #[test]
    fn one_issue_makes_report_invalid() {
        let mut report = Report::empty();
        report.push(Issue::new(ErrorCode::DuplicateNodeId, "nodes[1].id", "duplicate id \"a\""));
        assert!(!report.valid());
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn display_format() {
        let issue = Issue::new(ErrorCode::MissingRequiredField, "$.version", "missing version");
        assert_eq!(issue.to_string(), "MissingRequiredField at $.version: missing version");
    }
}
