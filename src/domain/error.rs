use std::fmt;

use serde::Serialize;

/// Category of a single failed assertion line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The line does not follow the assertion grammar.
    MalformedAssertion,
    /// The referenced audit is absent from the report.
    AuditNotFound,
    /// The audit has a score but the comparison did not hold.
    AssertionFailed,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedAssertion => "malformed_assertion",
            Self::AuditNotFound => "audit_not_found",
            Self::AssertionFailed => "assertion_failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed line of an assertion block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionFailure {
    /// 1-based line number in the assertion text, blank lines included.
    pub line: usize,
    pub assertion: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Every failure of one evaluation, in line order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationFailure {
    failures: Vec<AssertionFailure>,
}

impl EvaluationFailure {
    /// Returns `None` when there is nothing to report.
    pub fn from_failures(failures: Vec<AssertionFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.message.as_str())
    }
}

impl fmt::Display for EvaluationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.messages().collect::<Vec<_>>().join("\n");
        f.write_str(&joined)
    }
}

impl std::error::Error for EvaluationFailure {}
