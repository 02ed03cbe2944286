//! Cascading erasure of a trashed document and its dependency graph.
//!
//! # Responsibility
//! - Check the trash precondition on the root before any mutation.
//! - Collect the reachable graph and delete it in dependency-safe order.
//! - Run the whole cascade inside one store transaction.
//!
//! # Invariants
//! - The root is deleted first, then attachments, invoices, and documents.
//! - No target is deleted twice.
//! - A not-found target during deletion is logged and skipped.
//! - Any other failure aborts and rolls back every deletion of the call.

use super::erasure_graph::ErasureGraph;
use crate::auth::{AccessDenied, AccessPolicy, CallerIdentity};
use crate::model::document::{Document, TRASH_TAG_CODE, TRASH_TAG_SYSTEM};
use crate::model::outcome::{Issue, OperationOutcome, Severity};
use crate::model::resource::{ModelError, TypedId};
use crate::store::resource_store::{ResourceStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of a completed erasure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErasureReport {
    pub root: TypedId,
    /// Deleted resources in deletion order, root first.
    pub deleted: Vec<TypedId>,
    /// Targets that were already gone, during collection or deletion.
    pub skipped: Vec<TypedId>,
    /// Success outcome naming the root.
    pub outcome: OperationOutcome,
}

/// Erasure failure. Every variant leaves the store unchanged.
#[derive(Debug)]
pub enum ErasureError {
    /// Root id is not a valid resource id.
    InvalidRequest(ModelError),
    /// Root document does not exist.
    NotFound(TypedId),
    /// Root document is not tagged as trash.
    InvalidState { root: TypedId, reason: String },
    /// Caller may not erase the root document.
    Unauthorized(AccessDenied),
    /// Store failure during collection or deletion.
    Internal {
        target: Option<TypedId>,
        detail: String,
        source: Option<StoreError>,
    },
}

impl ErasureError {
    fn store(target: &TypedId, step: &str, err: StoreError) -> Self {
        Self::Internal {
            target: Some(target.clone()),
            detail: format!("{step} {target} failed: {err}"),
            source: Some(err),
        }
    }

    /// Structured rendering for callers.
    pub fn to_outcome(&self) -> OperationOutcome {
        let issue = match self {
            Self::InvalidRequest(err) => Issue::new(Severity::Error, None, err.to_string()),
            Self::NotFound(target) => Issue::at(
                Severity::Error,
                target.to_reference(),
                "resource not found",
            ),
            Self::InvalidState { root, reason } => {
                Issue::at(Severity::Error, root.to_reference(), reason.clone())
            }
            Self::Unauthorized(denied) => Issue::at(
                Severity::Error,
                denied.target.to_reference(),
                denied.reason.clone(),
            ),
            Self::Internal { target, detail, .. } => Issue::new(
                Severity::Fatal,
                target.as_ref().map(TypedId::to_reference),
                detail.clone(),
            ),
        };
        OperationOutcome::single(issue)
    }

    fn is_rejection(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }
}

impl Display for ErasureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(err) => write!(f, "invalid erase request: {err}"),
            Self::NotFound(target) => write!(f, "resource not found: {target}"),
            Self::InvalidState { root, reason } => {
                write!(f, "{root} cannot be erased: {reason}")
            }
            Self::Unauthorized(denied) => write!(f, "{denied}"),
            Self::Internal { detail, .. } => write!(f, "internal erasure error: {detail}"),
        }
    }
}

impl Error for ErasureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRequest(err) => Some(err),
            Self::Unauthorized(err) => Some(err),
            Self::Internal {
                source: Some(err), ..
            } => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ErasureError {
    fn from(value: StoreError) -> Self {
        Self::Internal {
            target: None,
            detail: format!("store transaction failed: {value}"),
            source: Some(value),
        }
    }
}

/// Erasure use-case over a resource store.
pub struct ErasureCascade<'a, S: ResourceStore> {
    store: &'a S,
}

impl<'a, S: ResourceStore> ErasureCascade<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Erases a trashed document and everything it transitively references.
    ///
    /// Trusts that the caller was authorized upstream.
    pub fn erase(&self, root_id: &str) -> Result<ErasureReport, ErasureError> {
        self.run(root_id, None)
    }

    /// Like [`erase`](Self::erase), but asks `policy` first.
    ///
    /// The access check runs after the root is loaded and before the trash
    /// precondition; a refusal leaves the store untouched.
    pub fn erase_as(
        &self,
        caller: &CallerIdentity,
        policy: &dyn AccessPolicy,
        root_id: &str,
    ) -> Result<ErasureReport, ErasureError> {
        self.run(root_id, Some((caller, policy)))
    }

    fn run(
        &self,
        root_id: &str,
        access: Option<(&CallerIdentity, &dyn AccessPolicy)>,
    ) -> Result<ErasureReport, ErasureError> {
        let root = TypedId::document(root_id).map_err(ErasureError::InvalidRequest)?;
        info!("event=document_erase module=erasure status=start root={root}");

        let result = self
            .store
            .in_transaction(|store| Self::cascade(store, &root, access));

        match &result {
            Ok(report) => info!(
                "event=document_erase module=erasure status=ok root={} deleted={} skipped={}",
                root,
                report.deleted.len(),
                report.skipped.len()
            ),
            Err(err) if err.is_rejection() => warn!(
                "event=document_erase module=erasure status=rejected root={root} error={err}"
            ),
            Err(err) => error!(
                "event=document_erase module=erasure status=error root={root} error={err}"
            ),
        }
        result
    }

    fn cascade(
        store: &S,
        root: &TypedId,
        access: Option<(&CallerIdentity, &dyn AccessPolicy)>,
    ) -> Result<ErasureReport, ErasureError> {
        let document = store
            .read::<Document>(&root.id)
            .map_err(|err| ErasureError::store(root, "read", err))?
            .ok_or_else(|| ErasureError::NotFound(root.clone()))?;

        if let Some((caller, policy)) = access {
            policy
                .authorize_erase(caller, root, &document)
                .map_err(ErasureError::Unauthorized)?;
        }

        if !document.has_tag(TRASH_TAG_SYSTEM, TRASH_TAG_CODE) {
            return Err(ErasureError::InvalidState {
                root: root.clone(),
                reason: format!("document is not tagged `{TRASH_TAG_SYSTEM}|{TRASH_TAG_CODE}`"),
            });
        }

        let graph = ErasureGraph::collect(store, root, &document)
            .map_err(|failure| ErasureError::store(&failure.target, "read", failure.source))?;

        // Root goes first so back-references to it are gone before the rest.
        store
            .delete(root)
            .map_err(|err| ErasureError::store(root, "delete", err))?;

        let mut deleted = Vec::with_capacity(graph.len() + 1);
        deleted.push(root.clone());
        let mut skipped: Vec<TypedId> = graph.unresolved.iter().cloned().collect();

        for target in graph.deletion_order().filter(|target| *target != root) {
            match store.delete(target) {
                Ok(()) => deleted.push(target.clone()),
                Err(err) if err.is_not_found() => {
                    warn!(
                        "event=erase_skip module=erasure phase=delete root={root} target={target} reason=not_found"
                    );
                    skipped.push(target.clone());
                }
                Err(err) => return Err(ErasureError::store(target, "delete", err)),
            }
        }

        let outcome = OperationOutcome::single(Issue::at(
            Severity::Information,
            root.to_reference(),
            format!(
                "{root} erased together with {} dependent resource(s)",
                deleted.len() - 1
            ),
        ));
        Ok(ErasureReport {
            root: root.clone(),
            deleted,
            skipped,
            outcome,
        })
    }
}
