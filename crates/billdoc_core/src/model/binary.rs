//! Opaque content blob referenced from a document's content list.

use super::resource::{Resource, ResourceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content_type: String,
    /// Base64 payload. Never decoded or logged by the core.
    pub data: String,
}

impl Binary {
    pub fn with_id(
        id: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

impl Resource for Binary {
    const KIND: ResourceKind = ResourceKind::Binary;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }
}
