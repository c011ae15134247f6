//! Coverage accounting: which distinct users labeled which image.
//!
//! # Responsibility
//! - Derive the per-image distinct-user sets from a label snapshot.
//! - Memoize that derivation for a bounded staleness window.
//!
//! # Invariants
//! - Coverage is a pure function of the event multiset; order and repeats
//!   do not change it.
//! - An image is complete once `REQUIRED_DISTINCT_USERS` users labeled it.

pub mod cache;
pub mod index;

/// Distinct users needed before an image stops being presented.
pub const REQUIRED_DISTINCT_USERS: usize = 2;
