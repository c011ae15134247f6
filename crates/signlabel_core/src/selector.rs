//! Image selection over the catalog and coverage index.
//!
//! # Invariants
//! - `eligible` preserves catalog order and excludes complete images.
//! - `pick_random` draws uniformly and never avoids repeats across calls.

use crate::coverage::index::CoverageIndex;
use crate::coverage::REQUIRED_DISTINCT_USERS;
use crate::model::label::ImageId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Catalog images whose coverage is still below the completion threshold.
pub fn eligible(catalog: &[ImageId], index: &CoverageIndex) -> Vec<ImageId> {
    catalog
        .iter()
        .filter(|image| index.coverage(image) < REQUIRED_DISTINCT_USERS)
        .cloned()
        .collect()
}

/// Uniform draw; `None` means every image is complete.
pub fn pick_random<R: Rng + ?Sized>(eligible: &[ImageId], rng: &mut R) -> Option<ImageId> {
    eligible.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::{eligible, pick_random};
    use crate::coverage::index::CoverageIndex;
    use crate::model::label::LabelEvent;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn catalog(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn no_events_keeps_whole_catalog_in_order() {
        let index = CoverageIndex::default();
        let images = catalog(&["img1", "img2"]);
        assert_eq!(eligible(&images, &index), images);
        assert_eq!(index.count_labeled_by(1), 0);
    }

    #[test]
    fn complete_images_are_excluded() {
        let events = [
            LabelEvent::new("A", "img1", Vec::new()),
            LabelEvent::new("B", "img1", Vec::new()),
            LabelEvent::new("A", "img1", Vec::new()),
            LabelEvent::new("A", "img2", Vec::new()),
        ];
        let index = CoverageIndex::compute(&events);
        let images = catalog(&["img1", "img2", "img3"]);
        assert_eq!(eligible(&images, &index), catalog(&["img2", "img3"]));
    }

    #[test]
    fn pick_random_handles_empty_and_singleton() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_random(&[], &mut rng), None);

        let only = catalog(&["img9"]);
        for _ in 0..20 {
            assert_eq!(pick_random(&only, &mut rng).as_deref(), Some("img9"));
        }
    }

    #[test]
    fn pick_random_reaches_every_eligible_image() {
        let mut rng = StdRng::seed_from_u64(42);
        let images = catalog(&["a", "b", "c"]);
        let drawn: BTreeSet<_> = (0..200)
            .filter_map(|_| pick_random(&images, &mut rng))
            .collect();
        assert_eq!(drawn.len(), 3);
    }
}
