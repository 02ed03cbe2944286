//! Caller identity and document-level access checks for erasure.
//!
//! Token introspection happens upstream; this module only decides whether an
//! already-authenticated caller may erase a given root document.

use crate::model::document::Document;
use crate::model::resource::TypedId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authenticated caller as supplied by the upstream authorization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Identifier of the person the caller acts for.
    pub subject: String,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Access decision refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub target: TypedId,
    pub reason: String,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "access to {} denied: {}", self.target, self.reason)
    }
}

impl Error for AccessDenied {}

/// Document-level access policy consulted before an erasure mutates anything.
pub trait AccessPolicy {
    fn authorize_erase(
        &self,
        caller: &CallerIdentity,
        root: &TypedId,
        document: &Document,
    ) -> Result<(), AccessDenied>;
}

/// Permits callers whose subject matches the document subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectAccessPolicy;

impl AccessPolicy for SubjectAccessPolicy {
    fn authorize_erase(
        &self,
        caller: &CallerIdentity,
        root: &TypedId,
        document: &Document,
    ) -> Result<(), AccessDenied> {
        match document.subject.as_deref() {
            Some(subject) if subject == caller.subject => Ok(()),
            Some(_) => Err(AccessDenied {
                target: root.clone(),
                reason: "caller is not the document subject".to_string(),
            }),
            None => Err(AccessDenied {
                target: root.clone(),
                reason: "document has no subject".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessPolicy, CallerIdentity, SubjectAccessPolicy};
    use crate::model::document::Document;
    use crate::model::resource::TypedId;

    #[test]
    fn subject_policy_matches_exact_subject() {
        let root = TypedId::document("doc-1").unwrap();
        let mut doc = Document::new();
        doc.subject = Some("X110411319".to_string());

        let policy = SubjectAccessPolicy;
        assert!(policy
            .authorize_erase(&CallerIdentity::new("X110411319"), &root, &doc)
            .is_ok());
        let denied = policy
            .authorize_erase(&CallerIdentity::new("X999999999"), &root, &doc)
            .unwrap_err();
        assert_eq!(denied.target, root);
    }

    #[test]
    fn subject_policy_denies_documents_without_subject() {
        let root = TypedId::document("doc-1").unwrap();
        let denied = SubjectAccessPolicy
            .authorize_erase(&CallerIdentity::new("X110411319"), &root, &Document::new())
            .unwrap_err();
        assert!(denied.reason.contains("no subject"));
    }
}
