//! Coverage index derived from label events.

use crate::model::label::{ImageId, LabelEvent};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from image to the distinct users who labeled it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageIndex {
    users_by_image: BTreeMap<ImageId, BTreeSet<String>>,
}

impl CoverageIndex {
    /// Aggregates events into per-image user sets.
    pub fn compute<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a LabelEvent>,
    {
        let mut users_by_image: BTreeMap<ImageId, BTreeSet<String>> = BTreeMap::new();
        for event in events {
            users_by_image
                .entry(event.image.clone())
                .or_default()
                .insert(event.user.clone());
        }
        Self { users_by_image }
    }

    /// Number of distinct users who labeled `image`.
    pub fn coverage(&self, image: &str) -> usize {
        self.users(image).map_or(0, BTreeSet::len)
    }

    pub fn users(&self, image: &str) -> Option<&BTreeSet<String>> {
        self.users_by_image.get(image)
    }

    /// Number of images labeled by at least `min_users` distinct users.
    ///
    /// Counts every image seen in the events, catalog or not.
    pub fn count_labeled_by(&self, min_users: usize) -> usize {
        self.users_by_image
            .values()
            .filter(|users| users.len() >= min_users)
            .count()
    }

    /// Like `count_labeled_by`, restricted to the given images.
    pub fn count_labeled_by_within<'a, I>(&self, images: I, min_users: usize) -> usize
    where
        I: IntoIterator<Item = &'a ImageId>,
    {
        images
            .into_iter()
            .filter(|image| self.coverage(image) >= min_users)
            .count()
    }

    /// Number of images with at least one label.
    pub fn image_count(&self) -> usize {
        self.users_by_image.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageId, &BTreeSet<String>)> {
        self.users_by_image.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::CoverageIndex;
    use crate::model::label::LabelEvent;

    fn event(user: &str, image: &str) -> LabelEvent {
        LabelEvent::new(user, image, Vec::new())
    }

    #[test]
    fn repeated_user_does_not_inflate_coverage() {
        let events = [event("A", "img1"), event("B", "img1"), event("A", "img1")];
        let index = CoverageIndex::compute(&events);
        assert_eq!(index.coverage("img1"), 2);
        assert_eq!(index.coverage("img2"), 0);
    }

    #[test]
    fn count_labeled_by_uses_thresholds() {
        let events = [
            event("A", "img1"),
            event("B", "img1"),
            event("A", "img2"),
            event("A", "img2"),
        ];
        let index = CoverageIndex::compute(&events);
        assert_eq!(index.count_labeled_by(1), 2);
        assert_eq!(index.count_labeled_by(2), 1);
        assert_eq!(index.count_labeled_by(3), 0);
    }

    #[test]
    fn within_ignores_images_outside_the_given_set() {
        let events = [event("A", "img1"), event("A", "retired.png")];
        let index = CoverageIndex::compute(&events);
        let catalog = vec!["img1".to_string(), "img2".to_string()];
        assert_eq!(index.count_labeled_by(1), 2);
        assert_eq!(index.count_labeled_by_within(&catalog, 1), 1);
    }
}
