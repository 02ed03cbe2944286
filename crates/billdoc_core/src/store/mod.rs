//! Persistence boundary for stored resources.
//!
//! # Responsibility
//! - Define the `ResourceStore` contract consumed by submission and erasure.
//! - Isolate SQLite and JSON details from orchestration code.
//!
//! # Invariants
//! - All mutations of one public operation run in one store transaction.
//! - Store APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to DB transport errors.

pub mod resource_store;
