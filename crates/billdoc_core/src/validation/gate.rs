//! Severity-based validation gate.
//!
//! # Responsibility
//! - Wrap an external validation engine and split its messages into
//!   blocking errors and advisory warnings.
//! - Turn blocking messages into a structured `ValidationFailed` report.
//!
//! # Invariants
//! - `Fatal` and `Error` block; `Warning` and `Information` never do.
//! - The gate holds no state and performs no mutation.

use crate::model::document::Document;
use crate::model::outcome::{Issue, OperationOutcome, Severity};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One message produced by a validation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub location: Option<String>,
    pub message: String,
}

impl ValidationMessage {
    pub fn new(
        severity: Severity,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            location: Some(location.into()),
            message: message.into(),
        }
    }

    fn to_issue(&self) -> Issue {
        Issue::new(self.severity, self.location.clone(), self.message.clone())
    }
}

/// External validation engine contract (profile/terminology checks).
pub trait ValidationEngine {
    fn validate(&self, document: &Document) -> Vec<ValidationMessage>;
}

impl<V: ValidationEngine + ?Sized> ValidationEngine for &V {
    fn validate(&self, document: &Document) -> Vec<ValidationMessage> {
        (**self).validate(document)
    }
}

/// Engine messages classified by blocking weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// `Fatal` and `Error` messages.
    pub errors: Vec<ValidationMessage>,
    /// `Warning` and `Information` messages.
    pub warnings: Vec<ValidationMessage>,
}

impl ValidationOutcome {
    fn classify(messages: Vec<ValidationMessage>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = messages
            .into_iter()
            .partition(|message| message.severity.is_blocking());
        Self { errors, warnings }
    }

    pub fn is_blocked(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Advisory side-channel report; may be empty.
    pub fn advisory_report(&self) -> OperationOutcome {
        OperationOutcome::new(
            self.warnings
                .iter()
                .map(ValidationMessage::to_issue)
                .collect(),
        )
    }

    /// Blocking report: fatal entries first, engine order kept within a severity.
    pub fn blocking_report(&self) -> OperationOutcome {
        let mut issues: Vec<Issue> = self
            .errors
            .iter()
            .map(ValidationMessage::to_issue)
            .collect();
        issues.sort_by(|left, right| right.severity.cmp(&left.severity));
        OperationOutcome::new(issues)
    }
}

/// Blocking validation failure carrying the full diagnostic report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailed {
    pub report: OperationOutcome,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed with {} blocking issue(s)", self.report.len())?;
        if let Some(first) = self.report.issues.first() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

impl Error for ValidationFailed {}

/// Gate in front of persistence.
pub struct ValidationGate<V: ValidationEngine> {
    engine: V,
}

impl<V: ValidationEngine> ValidationGate<V> {
    pub fn new(engine: V) -> Self {
        Self { engine }
    }

    /// Runs the engine and classifies its messages.
    pub fn validate(&self, document: &Document) -> ValidationOutcome {
        ValidationOutcome::classify(self.engine.validate(document))
    }

    /// Fails with `ValidationFailed` when any blocking message exists.
    ///
    /// On success returns the advisory report, which may be empty.
    pub fn validate_or_block(
        &self,
        document: &Document,
    ) -> Result<OperationOutcome, ValidationFailed> {
        let outcome = self.validate(document);
        debug!(
            "event=document_validate module=validation errors={} warnings={}",
            outcome.errors.len(),
            outcome.warnings.len()
        );
        if outcome.is_blocked() {
            return Err(ValidationFailed {
                report: outcome.blocking_report(),
            });
        }
        Ok(outcome.advisory_report())
    }
}

#[cfg(test)]
mod tests {
    use super::{ValidationEngine, ValidationGate, ValidationMessage};
    use crate::model::document::Document;
    use crate::model::outcome::Severity;

    struct Scripted(Vec<ValidationMessage>);

    impl ValidationEngine for Scripted {
        fn validate(&self, _document: &Document) -> Vec<ValidationMessage> {
            self.0.clone()
        }
    }

    fn message(severity: Severity, location: &str) -> ValidationMessage {
        ValidationMessage::new(severity, location, format!("{severity} at {location}"))
    }

    #[test]
    fn blocking_report_puts_fatal_first_and_keeps_engine_order() {
        let gate = ValidationGate::new(Scripted(vec![
            message(Severity::Error, "a"),
            message(Severity::Warning, "w"),
            message(Severity::Fatal, "b"),
            message(Severity::Error, "c"),
        ]));

        let failed = gate.validate_or_block(&Document::new()).unwrap_err();
        let locations: Vec<_> = failed
            .report
            .issues
            .iter()
            .map(|issue| issue.location.as_deref().unwrap())
            .collect();
        assert_eq!(locations, vec!["b", "a", "c"]);
    }

    #[test]
    fn advisory_messages_pass_through() {
        let gate = ValidationGate::new(Scripted(vec![
            message(Severity::Warning, "w"),
            message(Severity::Information, "i"),
        ]));

        let advisory = gate.validate_or_block(&Document::new()).unwrap();
        assert_eq!(advisory.len(), 2);
        assert!(!advisory.has_blocking());
    }

    #[test]
    fn clean_document_yields_empty_advisory_report() {
        let gate = ValidationGate::new(Scripted(Vec::new()));
        let advisory = gate.validate_or_block(&Document::new()).unwrap();
        assert!(advisory.is_empty());
    }
}
