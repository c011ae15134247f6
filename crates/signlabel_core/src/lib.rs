//! Core logic for crowd-sourced street-sign labeling.
//! This crate owns the coverage rules, image selection and label storage.

pub mod catalog;
pub mod config;
pub mod coverage;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod selector;
pub mod service;
pub mod session;
pub mod stats;

pub use catalog::{image_url, sample_examples, Catalog, CatalogError, CatalogSource};
pub use config::{ConfigError, LabelerConfig};
pub use coverage::cache::{is_stale, CoverageCache, DEFAULT_COVERAGE_TTL};
pub use coverage::index::CoverageIndex;
pub use coverage::REQUIRED_DISTINCT_USERS;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{Category, CategoryRegistry, SelectionError, SelectionMode};
pub use model::label::{ImageId, LabelEvent, LabelId, LabelValidationError, StoredLabel};
pub use repo::label_repo::{LabelStore, RepoError, RepoResult, SqliteLabelStore};
pub use repo::memory_repo::MemoryLabelStore;
pub use repo::worker::{PendingWrite, StoreWorker};
pub use selector::{eligible, pick_random};
pub use service::labeling_service::{
    LabelingError, LabelingOptions, LabelingResult, LabelingService, Submission, SubmitOutcome,
};
pub use session::{LabelSession, SessionError, SessionId, SessionState};
pub use stats::{Progress, UserStats};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
