//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and store calls into the public operations
//!   `submit` and `erase`.
//! - Own the transaction boundary of each public operation.

pub mod erasure_graph;
pub mod erasure_service;
pub mod submission_service;
