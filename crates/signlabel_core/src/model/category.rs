//! Defect category registry and selection rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How many categories one submission may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Exactly one category per submission.
    Single,
    /// Zero or more categories; empty means "no defect".
    #[default]
    Multi,
}

/// One defect classification shown to volunteers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub title: String,
    pub explanation: String,
}

impl Category {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            explanation: explanation.into(),
        }
    }
}

/// Reasons a category selection is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    UnknownCategory(String),
    /// Single mode received zero or several categories.
    ExpectedExactlyOne { got: usize },
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCategory(value) => write!(f, "unknown category: `{value}`"),
            Self::ExpectedExactlyOne { got } => write!(
                f,
                "single-label mode requires exactly one category, got {got}"
            ),
        }
    }
}

impl Error for SelectionError {}

/// Ordered set of categories offered for labeling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl Default for CategoryRegistry {
    /// Street-sign defect classes.
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "obscured",
                "Stickers / Graffiti",
                "Covered by stickers or graffiti, partially blocking the sign.",
            ),
            Category::new(
                "deterioration",
                "Weathering / Aging",
                "Natural wear like fading, peeling, or rust.",
            ),
            Category::new(
                "blurred",
                "Motion Blur",
                "Motion blur from moving platforms, softening edges.",
            ),
            Category::new(
                "occluded",
                "Occlusion",
                "Partially blocked by objects like foliage or vehicles.",
            ),
            Category::new(
                "quality",
                "Low Image Quality",
                "Low image quality due to resolution or sensor noise.",
            ),
            Category::new(
                "weather",
                "Adverse Lighting / Weather",
                "Challenging lighting or weather conditions, e.g., glare, rain.",
            ),
            Category::new(
                "angle",
                "Unusual Perspective",
                "Captured from unusual or high angles, causing perspective distortions.",
            ),
        ])
    }
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.key == key)
    }

    /// Resolves either a key or a display title to the canonical key.
    pub fn resolve(&self, key_or_title: &str) -> Option<&str> {
        let needle = key_or_title.trim();
        self.categories
            .iter()
            .find(|category| category.key == needle || category.title == needle)
            .map(|category| category.key.as_str())
    }

    /// Normalizes a raw selection into a set of known keys and applies
    /// the mode's cardinality rule.
    pub fn validate_selection<I, S>(
        &self,
        mode: SelectionMode,
        selected: I,
    ) -> Result<BTreeSet<String>, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = BTreeSet::new();
        for raw in selected {
            let raw = raw.as_ref();
            let key = self
                .resolve(raw)
                .ok_or_else(|| SelectionError::UnknownCategory(raw.to_string()))?;
            keys.insert(key.to_string());
        }

        if mode == SelectionMode::Single && keys.len() != 1 {
            return Err(SelectionError::ExpectedExactlyOne { got: keys.len() });
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoryRegistry, SelectionError, SelectionMode};

    #[test]
    fn resolve_accepts_titles_and_keys() {
        let registry = CategoryRegistry::default();
        assert_eq!(registry.resolve("Motion Blur"), Some("blurred"));
        assert_eq!(registry.resolve(" angle "), Some("angle"));
        assert_eq!(registry.resolve("okay"), None);
    }

    #[test]
    fn multi_mode_allows_empty_selection() {
        let registry = CategoryRegistry::default();
        let keys = registry
            .validate_selection(SelectionMode::Multi, Vec::<String>::new())
            .unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn single_mode_requires_exactly_one() {
        let registry = CategoryRegistry::default();
        let none = registry.validate_selection(SelectionMode::Single, Vec::<&str>::new());
        assert_eq!(none, Err(SelectionError::ExpectedExactlyOne { got: 0 }));

        let two = registry.validate_selection(SelectionMode::Single, ["blurred", "angle"]);
        assert_eq!(two, Err(SelectionError::ExpectedExactlyOne { got: 2 }));

        let duplicate = registry
            .validate_selection(SelectionMode::Single, ["blurred", "Motion Blur"])
            .unwrap();
        assert_eq!(duplicate.len(), 1);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let registry = CategoryRegistry::default();
        let err = registry
            .validate_selection(SelectionMode::Multi, ["rust"])
            .unwrap_err();
        assert_eq!(err, SelectionError::UnknownCategory("rust".to_string()));
    }
}
