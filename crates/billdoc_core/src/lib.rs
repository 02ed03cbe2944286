//! Core domain logic for billing document intake and erasure.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod token;
pub mod validation;

pub use auth::{AccessDenied, AccessPolicy, CallerIdentity, SubjectAccessPolicy};
pub use config::{ConfigError, CoreConfig};
pub use context::CoreContext;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::binary::Binary;
pub use model::document::{
    Attachment, Coding, Document, DocumentRelation, DocumentStatus, RelationCode,
};
pub use model::invoice::{Invoice, InvoiceStatus, Money};
pub use model::outcome::{Issue, OperationOutcome, Severity};
pub use model::resource::{ModelError, Resource, ResourceKind, TypedId};
pub use service::erasure_service::{ErasureCascade, ErasureError, ErasureReport};
pub use service::submission_service::{
    SubmissionError, SubmissionMode, SubmissionOutcome, SubmissionPipeline,
};
pub use store::resource_store::{
    ResourceStore, SqliteResourceStore, StoreError, StoreOutcome, StoreResult,
};
pub use token::{TokenGenerator, UuidTokenGenerator};
pub use validation::gate::{
    ValidationEngine, ValidationFailed, ValidationGate, ValidationMessage, ValidationOutcome,
};
pub use validation::rules::DocumentRules;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
