//! Label store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the append-only label store contract.
//! - Isolate SQLite query details from coverage and service logic.
//!
//! # Invariants
//! - Stores only append; no update or delete path exists.
//! - Write paths must call `LabelEvent::validate()` before persisting.

pub mod label_repo;
pub mod memory_repo;
pub mod worker;
