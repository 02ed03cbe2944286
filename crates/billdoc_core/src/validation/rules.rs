//! Built-in structural validation engine.
//!
//! Checks the reference shapes the submission and erasure components rely
//! on. Profile and terminology validation stay with external engines.

use super::gate::{ValidationEngine, ValidationMessage};
use crate::model::document::{Document, DocumentStatus, RelationCode};
use crate::model::outcome::Severity;
use crate::model::resource::{ResourceKind, TypedId};

/// Structural rules for submitted documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRules;

impl ValidationEngine for DocumentRules {
    fn validate(&self, document: &Document) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();

        if document.status == DocumentStatus::EnteredInError {
            messages.push(ValidationMessage::new(
                Severity::Fatal,
                "DocumentReference.status",
                "documents entered in error cannot be submitted",
            ));
        }

        if document.content.is_empty() {
            messages.push(ValidationMessage::new(
                Severity::Error,
                "DocumentReference.content",
                "document must carry at least one attachment",
            ));
        }
        for (index, attachment) in document.content.iter().enumerate() {
            if !references_kind(&attachment.url, &[ResourceKind::Binary]) {
                messages.push(ValidationMessage::new(
                    Severity::Error,
                    format!("DocumentReference.content[{index}].attachment.url"),
                    format!("`{}` is not a Binary reference", attachment.url),
                ));
            }
            if attachment.content_type.is_none() {
                messages.push(ValidationMessage::new(
                    Severity::Warning,
                    format!("DocumentReference.content[{index}].attachment.contentType"),
                    "attachment has no content type",
                ));
            }
        }

        for (index, reference) in document.related.iter().enumerate() {
            if !references_kind(reference, &[ResourceKind::Document, ResourceKind::Invoice]) {
                messages.push(ValidationMessage::new(
                    Severity::Error,
                    format!("DocumentReference.context.related[{index}]"),
                    format!("`{reference}` is not a DocumentReference or Invoice reference"),
                ));
            }
        }

        for (index, relation) in document.relates_to.iter().enumerate() {
            if !references_kind(&relation.target, &[ResourceKind::Document]) {
                messages.push(ValidationMessage::new(
                    Severity::Error,
                    format!("DocumentReference.relatesTo[{index}].target"),
                    format!("`{}` is not a DocumentReference reference", relation.target),
                ));
            }
        }
        let transforms = document
            .relates_to
            .iter()
            .filter(|relation| relation.code == RelationCode::Transforms)
            .count();
        if transforms > 1 {
            messages.push(ValidationMessage::new(
                Severity::Error,
                "DocumentReference.relatesTo",
                format!("{transforms} transforms relations present; at most one is allowed"),
            ));
        }

        if document.subject.is_none() {
            messages.push(ValidationMessage::new(
                Severity::Warning,
                "DocumentReference.subject",
                "document has no subject",
            ));
        }
        if document.description.is_none() {
            messages.push(ValidationMessage::new(
                Severity::Information,
                "DocumentReference.description",
                "document has no description",
            ));
        }

        messages
    }
}

fn references_kind(reference: &str, accepted: &[ResourceKind]) -> bool {
    TypedId::parse_reference(reference)
        .map(|typed| accepted.contains(&typed.kind))
        .unwrap_or(false)
}
