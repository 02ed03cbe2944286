//! Document submission use-case.
//!
//! # Responsibility
//! - Validate an inbound document and block on errors.
//! - In normal mode, persist the original and a derived copy that
//!   `transforms` it, both inside one store transaction.
//!
//! # Invariants
//! - Test mode never touches the store, not even to open a transaction.
//! - A blocked or failed submission leaves nothing persisted.
//! - The derived copy is stored under exactly the generated token; a
//!   mismatch or a collision with an existing document is an internal error.

use crate::model::document::Document;
use crate::model::outcome::{Issue, OperationOutcome, Severity};
use crate::model::resource::{Resource, ResourceKind, TypedId};
use crate::store::resource_store::{ResourceStore, StoreError};
use crate::token::TokenGenerator;
use crate::validation::gate::{ValidationEngine, ValidationFailed, ValidationGate};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Submission processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// Validate and persist.
    Normal,
    /// Validate only.
    Test,
}

impl SubmissionMode {
    /// Parses a mode flag. Anything other than `normal` selects `Test`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "normal" => Self::Normal,
            _ => Self::Test,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Test => "test",
        }
    }
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionOutcome {
    /// Advisory report; `None` only when no document was supplied.
    pub warnings: Option<OperationOutcome>,
    /// Persisted derived document; always `None` in test mode.
    pub transformed: Option<Document>,
}

/// Submission failure.
#[derive(Debug)]
pub enum SubmissionError {
    /// Blocking validation messages; nothing was persisted.
    ValidationFailed(ValidationFailed),
    /// Store failure or inconsistency; the transaction was rolled back.
    Internal {
        target: Option<TypedId>,
        detail: String,
        source: Option<StoreError>,
    },
}

impl SubmissionError {
    fn internal(target: Option<TypedId>, detail: impl Into<String>) -> Self {
        Self::Internal {
            target,
            detail: detail.into(),
            source: None,
        }
    }

    fn store(target: Option<TypedId>, step: &str, err: StoreError) -> Self {
        Self::Internal {
            target,
            detail: format!("{step} failed: {err}"),
            source: Some(err),
        }
    }

    /// Structured rendering for callers.
    pub fn to_outcome(&self) -> OperationOutcome {
        match self {
            Self::ValidationFailed(failed) => failed.report.clone(),
            Self::Internal { target, detail, .. } => OperationOutcome::single(Issue::new(
                Severity::Fatal,
                target.as_ref().map(TypedId::to_reference),
                detail.clone(),
            )),
        }
    }
}

impl Display for SubmissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(failed) => write!(f, "{failed}"),
            Self::Internal {
                target: Some(target),
                detail,
                ..
            } => write!(f, "internal submission error at {target}: {detail}"),
            Self::Internal { detail, .. } => write!(f, "internal submission error: {detail}"),
        }
    }
}

impl Error for SubmissionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(failed) => Some(failed),
            Self::Internal {
                source: Some(err), ..
            } => Some(err),
            Self::Internal { source: None, .. } => None,
        }
    }
}

impl From<ValidationFailed> for SubmissionError {
    fn from(value: ValidationFailed) -> Self {
        Self::ValidationFailed(value)
    }
}

impl From<StoreError> for SubmissionError {
    fn from(value: StoreError) -> Self {
        Self::store(None, "store transaction", value)
    }
}

/// Validate, persist, and derive pipeline.
pub struct SubmissionPipeline<'a, S, V, G>
where
    S: ResourceStore,
    V: ValidationEngine,
    G: TokenGenerator,
{
    store: &'a S,
    gate: ValidationGate<&'a V>,
    tokens: &'a G,
}

impl<'a, S, V, G> SubmissionPipeline<'a, S, V, G>
where
    S: ResourceStore,
    V: ValidationEngine,
    G: TokenGenerator,
{
    pub fn new(store: &'a S, engine: &'a V, tokens: &'a G) -> Self {
        Self {
            store,
            gate: ValidationGate::new(engine),
            tokens,
        }
    }

    /// Submits one document.
    ///
    /// # Contract
    /// - `None` input returns an empty outcome without validating.
    /// - Blocking validation messages return `ValidationFailed` unchanged.
    /// - `Test` mode returns the advisory report only.
    /// - `Normal` mode returns the advisory report and the stored derived copy.
    pub fn submit(
        &self,
        document: Option<&Document>,
        mode: SubmissionMode,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let Some(document) = document else {
            debug!("event=document_submit module=submission status=skipped reason=no_document");
            return Ok(SubmissionOutcome::default());
        };

        info!(
            "event=document_submit module=submission status=start mode={}",
            mode.as_str()
        );
        let warnings = match self.gate.validate_or_block(document) {
            Ok(warnings) => warnings,
            Err(failed) => {
                info!(
                    "event=document_submit module=submission status=blocked mode={} errors={}",
                    mode.as_str(),
                    failed.report.len()
                );
                return Err(failed.into());
            }
        };

        if mode == SubmissionMode::Test {
            info!(
                "event=document_submit module=submission status=ok mode=test warnings={}",
                warnings.len()
            );
            return Ok(SubmissionOutcome {
                warnings: Some(warnings),
                transformed: None,
            });
        }

        match self
            .store
            .in_transaction(|store| self.persist_pair(store, document))
        {
            Ok(transformed) => {
                info!(
                    "event=document_submit module=submission status=ok mode=normal transformed={} warnings={}",
                    transformed.id.as_deref().unwrap_or("-"),
                    warnings.len()
                );
                Ok(SubmissionOutcome {
                    warnings: Some(warnings),
                    transformed: Some(transformed),
                })
            }
            Err(err) => {
                error!(
                    "event=document_submit module=submission status=error mode=normal error={err}"
                );
                Err(err)
            }
        }
    }

    fn persist_pair(&self, store: &S, document: &Document) -> Result<Document, SubmissionError> {
        let created = store
            .create(document)
            .map_err(|err| SubmissionError::store(document.typed_id(), "create original", err))?;
        let original = TypedId {
            kind: ResourceKind::Document,
            id: created.id.clone(),
        };
        if !created.created {
            return Err(SubmissionError::internal(
                Some(original),
                "store did not confirm creation of the original",
            ));
        }

        let mut derived = created.resource;
        derived.set_id(None);
        let token = self.tokens.generate_unique_token();
        derived.set_id(Some(token.clone()));
        derived.set_transforms(&original);

        let derived_target = derived.typed_id();
        let stored = store
            .update(&derived)
            .map_err(|err| SubmissionError::store(derived_target.clone(), "store derived", err))?;
        if stored.id != token {
            return Err(SubmissionError::internal(
                derived_target,
                format!("store returned id `{}` for token `{token}`", stored.id),
            ));
        }
        if !stored.created {
            return Err(SubmissionError::internal(
                derived_target,
                "generated token collides with an existing document",
            ));
        }

        debug!(
            "event=document_derive module=submission original={} derived={}",
            original, stored.id
        );
        Ok(stored.resource)
    }
}
