//! Structured diagnostic outcomes returned to callers.
//!
//! Every user-visible result, success or failure, is expressed as a list of
//! severity-tagged issues with an optional location, never as a bare string.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Diagnostic severity.
///
/// Ordering follows blocking weight: `Fatal > Error > Warning > Information`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Information,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// `Fatal` and `Error` block persistence; the rest are advisory.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Fatal | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    /// Element path or `Kind/id` the entry refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub diagnostics: String,
}

impl Issue {
    pub fn new(
        severity: Severity,
        location: Option<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            location,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn at(
        severity: Severity,
        location: impl Into<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self::new(severity, Some(location.into()), diagnostics)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "[{}] {}: {}", self.severity, location, self.diagnostics),
            None => write!(f, "[{}] {}", self.severity, self.diagnostics),
        }
    }
}

/// Ordered collection of diagnostic entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub issues: Vec<Issue>,
}

impl OperationOutcome {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Outcome with one entry.
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether any entry blocks persistence.
    pub fn has_blocking(&self) -> bool {
        self.issues.iter().any(|issue| issue.severity.is_blocking())
    }

    /// Highest severity present, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}
