//! Billing document model.
//!
//! # Responsibility
//! - Define the submittable/erasable document record and its link shapes.
//! - Expose the graph edges used by the erasure cascade.
//!
//! # Invariants
//! - A document carries at most one `transforms` relation.
//! - Only documents tagged with the trash marker may enter erasure as root.

use super::resource::{ModelError, Resource, ResourceKind, TypedId};
use log::warn;
use serde::{Deserialize, Serialize};

/// Code system of the document marker tags.
pub const TRASH_TAG_SYSTEM: &str = "https://billdoc.dev/fhir/CodeSystem/document-marker";
/// Marker code flagging a document as eligible for erasure.
pub const TRASH_TAG_CODE: &str = "trash";
const TRASH_TAG_DISPLAY: &str = "Papierkorb";

/// Document lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    #[default]
    Current,
    Superseded,
    EnteredInError,
}

/// Code/system pair used for status tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: None,
        }
    }

    /// The trash marker tag.
    pub fn trash() -> Self {
        Self {
            system: TRASH_TAG_SYSTEM.to_string(),
            code: TRASH_TAG_CODE.to_string(),
            display: Some(TRASH_TAG_DISPLAY.to_string()),
        }
    }

    fn matches(&self, system: &str, code: &str) -> bool {
        self.system == system && self.code == code
    }
}

/// Content entry pointing at a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Relative `Binary/<id>` reference.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn binary(id: &str, content_type: impl Into<String>) -> Self {
        Self {
            url: format!("{}/{id}", ResourceKind::Binary.as_str()),
            content_type: Some(content_type.into()),
        }
    }
}

/// Typed document-to-document relation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationCode {
    /// Derived document pointing at the original it was cloned from.
    Transforms,
    Replaces,
    Appends,
    Signs,
}

/// Outbound typed relation to another document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRelation {
    pub code: RelationCode,
    /// Relative `DocumentReference/<id>` reference.
    pub target: String,
}

/// Billing document record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    /// Status tags (`meta.tag`), including the trash marker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Coding>,
    /// Identifier of the person the document is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relates_to: Vec<DocumentRelation>,
    /// Context references to documents and invoices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a tag with the exact `system` + `code` pair is present.
    pub fn has_tag(&self, system: &str, code: &str) -> bool {
        self.tags.iter().any(|tag| tag.matches(system, code))
    }

    pub fn is_trashed(&self) -> bool {
        self.has_tag(TRASH_TAG_SYSTEM, TRASH_TAG_CODE)
    }

    /// Adds the trash marker once.
    pub fn mark_trash(&mut self) {
        if !self.is_trashed() {
            self.tags.push(Coding::trash());
        }
    }

    /// Target of the `transforms` relation, when present and well-formed.
    pub fn transforms_target(&self) -> Option<TypedId> {
        self.relates_to
            .iter()
            .filter(|relation| relation.code == RelationCode::Transforms)
            .find_map(|relation| self.resolve(&relation.target, ResourceKind::Document))
    }

    /// Replaces any existing `transforms` relation with one pointing at `original`.
    pub fn set_transforms(&mut self, original: &TypedId) {
        self.relates_to
            .retain(|relation| relation.code != RelationCode::Transforms);
        self.relates_to.push(DocumentRelation {
            code: RelationCode::Transforms,
            target: original.to_reference(),
        });
    }

    /// Blobs referenced by the content list.
    pub fn attachment_refs(&self) -> Vec<TypedId> {
        self.content
            .iter()
            .filter_map(|attachment| self.resolve(&attachment.url, ResourceKind::Binary))
            .collect()
    }

    /// Financial records referenced from the context list.
    pub fn invoice_refs(&self) -> Vec<TypedId> {
        self.related
            .iter()
            .filter_map(|reference| self.resolve(reference, ResourceKind::Invoice))
            .collect()
    }

    /// Documents reached through generic association edges.
    ///
    /// Covers context document references plus every non-`transforms`
    /// relation; the `transforms` edge is exposed separately.
    pub fn related_document_refs(&self) -> Vec<TypedId> {
        let context = self
            .related
            .iter()
            .filter_map(|reference| self.resolve(reference, ResourceKind::Document));
        let relations = self
            .relates_to
            .iter()
            .filter(|relation| relation.code != RelationCode::Transforms)
            .filter_map(|relation| self.resolve(&relation.target, ResourceKind::Document));
        context.chain(relations).collect()
    }

    fn resolve(&self, reference: &str, expected: ResourceKind) -> Option<TypedId> {
        match TypedId::parse_reference(reference) {
            Ok(typed) if typed.kind == expected => Some(typed),
            Ok(_) => None,
            Err(err) => {
                warn!(
                    "event=reference_skip module=model status=malformed document={} kind={} error={}",
                    self.id.as_deref().unwrap_or("-"),
                    expected,
                    err
                );
                None
            }
        }
    }
}

impl Resource for Document {
    const KIND: ResourceKind = ResourceKind::Document;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ModelError> {
        if let Some(id) = self.id.as_deref() {
            TypedId::document(id)?;
        }
        let count = self
            .relates_to
            .iter()
            .filter(|relation| relation.code == RelationCode::Transforms)
            .count();
        if count > 1 {
            return Err(ModelError::MultipleTransforms { count });
        }
        Ok(())
    }
}
