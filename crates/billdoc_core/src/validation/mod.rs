//! Intake validation in front of persistence.
//!
//! # Responsibility
//! - Define the validation engine contract consumed by the core.
//! - Gate submissions on blocking severities.
//! - Ship a structural rule set usable without an external engine.

pub mod gate;
pub mod rules;
