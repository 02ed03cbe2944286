//! Resource identity shared by every stored record.
//!
//! # Responsibility
//! - Name the resource kinds handled by the core and their wire names.
//! - Provide `TypedId`, the `(kind, id)` key used for deduplication.
//! - Parse and render `Kind/id` reference strings.
//!
//! # Invariants
//! - Ids match `[A-Za-z0-9\-\.]{1,64}`.
//! - Two `TypedId`s are equal only when both kind and id are equal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static RESOURCE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("valid resource id regex"));

/// Kind of a stored resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Billing document (invoice-like artifact).
    #[serde(rename = "DocumentReference")]
    Document,
    /// Financial record attached to a document.
    #[serde(rename = "Invoice")]
    Invoice,
    /// Opaque content blob referenced by a document.
    #[serde(rename = "Binary")]
    Binary,
}

impl ResourceKind {
    /// Stable wire name used in references and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "DocumentReference",
            Self::Invoice => "Invoice",
            Self::Binary => "Binary",
        }
    }

    /// Parses a wire name. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DocumentReference" => Some(Self::Document),
            "Invoice" => Some(Self::Invoice),
            "Binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versionless `(kind, id)` pair.
///
/// Ordering is kind first, then id, so sets of `TypedId` iterate
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypedId {
    pub kind: ResourceKind,
    pub id: String,
}

impl TypedId {
    /// Builds a typed id after checking the id format.
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if !is_valid_resource_id(&id) {
            return Err(ModelError::InvalidId(id));
        }
        Ok(Self { kind, id })
    }

    pub fn document(id: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(ResourceKind::Document, id)
    }

    /// Parses a relative `Kind/id` reference.
    ///
    /// A trailing `/_history/<version>` segment is ignored so that versioned
    /// references resolve to the same versionless key.
    pub fn parse_reference(reference: &str) -> Result<Self, ModelError> {
        let trimmed = reference.trim();
        let mut segments = trimmed.split('/');
        let (Some(kind), Some(id)) = (segments.next(), segments.next()) else {
            return Err(ModelError::MalformedReference(reference.to_string()));
        };
        match (segments.next(), segments.next(), segments.next()) {
            (None, None, None) => {}
            (Some("_history"), Some(version), None) if !version.is_empty() => {}
            _ => return Err(ModelError::MalformedReference(reference.to_string())),
        }

        let kind = ResourceKind::parse(kind)
            .ok_or_else(|| ModelError::MalformedReference(reference.to_string()))?;
        Self::new(kind, id).map_err(|_| ModelError::MalformedReference(reference.to_string()))
    }

    /// Renders the relative `Kind/id` reference.
    pub fn to_reference(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.id)
    }
}

impl Display for TypedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// Returns whether `value` is an acceptable resource id.
pub fn is_valid_resource_id(value: &str) -> bool {
    RESOURCE_ID_RE.is_match(value)
}

/// Violations of resource-level invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Id is blank or contains unsupported characters.
    InvalidId(String),
    /// Reference string is not a supported `Kind/id` reference.
    MalformedReference(String),
    /// A document carries more than one `transforms` relation.
    MultipleTransforms { count: usize },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "invalid resource id: `{value}`"),
            Self::MalformedReference(value) => write!(f, "malformed reference: `{value}`"),
            Self::MultipleTransforms { count } => write!(
                f,
                "document carries {count} transforms relations; at most one is allowed"
            ),
        }
    }
}

impl Error for ModelError {}

/// Common contract for records persisted by a resource store.
pub trait Resource: Clone + Serialize + DeserializeOwned {
    /// Kind under which this resource is stored.
    const KIND: ResourceKind;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    /// Checks resource-level invariants before persistence.
    fn validate(&self) -> Result<(), ModelError> {
        match self.id() {
            Some(id) if !is_valid_resource_id(id) => Err(ModelError::InvalidId(id.to_string())),
            _ => Ok(()),
        }
    }

    /// Typed id, when the resource has been assigned one.
    fn typed_id(&self) -> Option<TypedId> {
        self.id().map(|id| TypedId {
            kind: Self::KIND,
            id: id.to_string(),
        })
    }
}
