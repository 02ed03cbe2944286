//! Dependency graph discovery for document erasure.
//!
//! # Responsibility
//! - Walk every resource reachable from a root document with an explicit
//!   worklist and a visited set keyed by `TypedId`.
//! - Return an immutable, deduplicated set of deletion targets.
//!
//! # Invariants
//! - The root is visited first and never appears in `documents`.
//! - Each `TypedId` is visited at most once, so cycles terminate.
//! - Only the root's own `transforms` edge is followed.
//! - Documents that cannot be loaded are recorded in `unresolved` and skipped.

use crate::model::document::Document;
use crate::model::resource::TypedId;
use crate::store::resource_store::{ResourceStore, StoreError};
use log::{debug, warn};
use std::collections::{BTreeSet, HashSet};

/// Store failure while loading one reachable document.
#[derive(Debug)]
pub struct CollectFailure {
    /// Document whose read failed.
    pub target: TypedId,
    pub source: StoreError,
}

/// Deletion targets discovered from one root document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErasureGraph {
    pub attachments: BTreeSet<TypedId>,
    pub invoices: BTreeSet<TypedId>,
    /// Reachable documents, root excluded.
    pub documents: BTreeSet<TypedId>,
    /// Referenced documents missing from the store.
    pub unresolved: BTreeSet<TypedId>,
}

impl ErasureGraph {
    /// Collects the graph reachable from `root`.
    ///
    /// `root_document` is the already-loaded root; it is not read again.
    /// Store failures other than a missing document abort collection and
    /// name the document being read.
    pub fn collect<S: ResourceStore>(
        store: &S,
        root: &TypedId,
        root_document: &Document,
    ) -> Result<Self, CollectFailure> {
        let mut graph = Self::default();
        let mut visited = HashSet::from([root.clone()]);
        graph.absorb(root_document);

        let mut pending = root_document.related_document_refs();
        pending.extend(root_document.transforms_target());

        while let Some(next) = pending.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }

            let loaded = match store.read::<Document>(&next.id) {
                Ok(loaded) => loaded,
                Err(source) => {
                    return Err(CollectFailure {
                        target: next,
                        source,
                    })
                }
            };
            match loaded {
                Some(document) => {
                    graph.absorb(&document);
                    pending.extend(document.related_document_refs());
                    graph.documents.insert(next);
                }
                None => {
                    warn!(
                        "event=erase_skip module=erasure phase=collect root={} target={} reason=not_found",
                        root, next
                    );
                    graph.unresolved.insert(next);
                }
            }
        }

        debug!(
            "event=erase_collect module=erasure root={} attachments={} invoices={} documents={} unresolved={}",
            root,
            graph.attachments.len(),
            graph.invoices.len(),
            graph.documents.len(),
            graph.unresolved.len()
        );
        Ok(graph)
    }

    /// Number of deletion targets, root excluded.
    pub fn len(&self) -> usize {
        self.attachments.len() + self.invoices.len() + self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Targets in deletion order: attachments, then invoices, then documents.
    pub fn deletion_order(&self) -> impl Iterator<Item = &TypedId> {
        self.attachments
            .iter()
            .chain(self.invoices.iter())
            .chain(self.documents.iter())
    }

    fn absorb(&mut self, document: &Document) {
        self.attachments.extend(document.attachment_refs());
        self.invoices.extend(document.invoice_refs());
    }
}
