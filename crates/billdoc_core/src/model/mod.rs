//! Domain model for billing documents and their dependent resources.
//!
//! # Responsibility
//! - Define the stored resource shapes: documents, invoices, binaries.
//! - Define `TypedId`, the deduplication key across the resource graph.
//! - Define the structured outcome returned by every public operation.
//!
//! # Invariants
//! - Every stored resource is keyed by a versionless `(kind, id)` pair.
//! - Deletion is physical; there are no tombstones in this model.

pub mod binary;
pub mod document;
pub mod invoice;
pub mod outcome;
pub mod resource;
