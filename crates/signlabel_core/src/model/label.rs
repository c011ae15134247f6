//! Label event model.
//!
//! # Responsibility
//! - Define the append-only record produced by one submission.
//! - Provide validation shared by write and read paths.
//!
//! # Invariants
//! - `user` and `image` are non-empty after trimming.
//! - `categories` has set semantics; ordering is always ascending.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Image identifier as it appears in the catalog (relative path or key).
pub type ImageId = String;

/// Store-assigned identity of a persisted label row.
pub type LabelId = i64;

/// Validation failures for label events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValidationError {
    EmptyUser,
    EmptyImage,
}

impl Display for LabelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUser => write!(f, "label user must not be empty"),
            Self::EmptyImage => write!(f, "label image must not be empty"),
        }
    }
}

impl Error for LabelValidationError {}

/// One immutable submission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEvent {
    /// Trimmed volunteer name.
    pub user: String,
    /// Catalog identifier of the labeled image.
    pub image: ImageId,
    /// Selected defect category keys. Empty means "no defect".
    pub categories: BTreeSet<String>,
    /// Submission instant.
    pub timestamp: DateTime<Utc>,
}

impl LabelEvent {
    /// Creates an event stamped with the current UTC time.
    pub fn new(
        user: impl Into<String>,
        image: impl Into<ImageId>,
        categories: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::at(user, image, categories, Utc::now())
    }

    /// Creates an event with a caller-provided timestamp.
    pub fn at(
        user: impl Into<String>,
        image: impl Into<ImageId>,
        categories: impl IntoIterator<Item = String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user: user.into(),
            image: image.into(),
            categories: categories.into_iter().collect(),
            timestamp,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), LabelValidationError> {
        if self.user.trim().is_empty() {
            return Err(LabelValidationError::EmptyUser);
        }
        if self.image.trim().is_empty() {
            return Err(LabelValidationError::EmptyImage);
        }
        Ok(())
    }

    /// Timestamp rendered as RFC 3339 text with microsecond precision.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Label event together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLabel {
    pub id: LabelId,
    pub event: LabelEvent,
}

#[cfg(test)]
mod tests {
    use super::{LabelEvent, LabelValidationError};

    #[test]
    fn categories_are_deduplicated_and_sorted() {
        let event = LabelEvent::new(
            "ana",
            "img/1.jpg",
            ["occluded".to_string(), "angle".to_string(), "angle".to_string()],
        );
        let keys: Vec<_> = event.categories.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["angle", "occluded"]);
    }

    #[test]
    fn validate_rejects_blank_user() {
        let event = LabelEvent::new("   ", "img/1.jpg", Vec::new());
        assert_eq!(event.validate(), Err(LabelValidationError::EmptyUser));
    }
}
