//! Financial record attached to a billing document.
//!
//! Invoices are stored and deleted independently of their documents and hold
//! no outbound references of their own.

use super::resource::{Resource, ResourceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    Balanced,
    Cancelled,
    EnteredInError,
}

/// Monetary amount in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub value: i64,
    pub currency: String,
}

impl Money {
    pub fn eur(cents: i64) -> Self {
        Self {
            value: cents,
            currency: "EUR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// Issue date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_net: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_gross: Option<Money>,
}

impl Invoice {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl Resource for Invoice {
    const KIND: ResourceKind = ResourceKind::Invoice;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }
}
