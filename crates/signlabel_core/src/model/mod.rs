//! Domain model for label events and defect categories.
//!
//! # Responsibility
//! - Define the immutable label record shared by store, coverage and service.
//! - Define the category registry and selection rules.
//!
//! # Invariants
//! - Label events are never mutated after creation.
//! - Category keys are lowercase ASCII identifiers.

pub mod category;
pub mod label;
