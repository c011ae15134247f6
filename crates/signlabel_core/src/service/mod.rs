//! Labeling use-case services.
//!
//! # Responsibility
//! - Drive the session state machine from selection and submission calls.
//! - Keep callers decoupled from the store worker and coverage cache.

pub mod labeling_service;
