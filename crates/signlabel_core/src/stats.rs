//! Progress and per-volunteer statistics.

use crate::coverage::index::CoverageIndex;
use crate::coverage::REQUIRED_DISTINCT_USERS;
use crate::model::label::{ImageId, LabelEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Labeling progress over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// Catalog images with at least one label.
    pub labeled_once: usize,
    /// Catalog images with the required number of distinct labelers.
    pub labeled_complete: usize,
    pub total: usize,
}

impl Progress {
    pub fn compute(catalog: &[ImageId], index: &CoverageIndex) -> Self {
        Self {
            labeled_once: index.count_labeled_by_within(catalog, 1),
            labeled_complete: index.count_labeled_by_within(catalog, REQUIRED_DISTINCT_USERS),
            total: catalog.len(),
        }
    }

    /// Share of catalog images labeled at least once, in `0.0..=1.0`.
    ///
    /// An empty catalog reports `0.0`.
    pub fn fraction_once(&self) -> f64 {
        fraction(self.labeled_once, self.total)
    }

    pub fn fraction_complete(&self) -> f64 {
        fraction(self.labeled_complete, self.total)
    }
}

fn fraction(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64).min(1.0)
}

/// Contribution summary for one volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Number of events submitted, repeats included.
    pub total_labeled: usize,
    /// 1-based position by event count; `None` before the first label.
    pub rank: Option<usize>,
}

impl UserStats {
    /// Ranks users by event count descending, ties by name ascending.
    pub fn compute<'a, I>(events: I, user: &str) -> Self
    where
        I: IntoIterator<Item = &'a LabelEvent>,
    {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for event in events {
            *counts.entry(event.user.as_str()).or_default() += 1;
        }

        let total_labeled = counts.get(user).copied().unwrap_or(0);
        let mut ranking: Vec<(&str, usize)> = counts.into_iter().collect();
        ranking.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        let rank = ranking
            .iter()
            .position(|(name, _)| *name == user)
            .map(|position| position + 1);

        Self {
            total_labeled,
            rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Progress, UserStats};
    use crate::coverage::index::CoverageIndex;
    use crate::model::label::LabelEvent;

    #[test]
    fn empty_catalog_reports_zero_fraction() {
        let progress = Progress::compute(&[], &CoverageIndex::default());
        assert_eq!(progress.total, 0);
        assert_eq!(progress.fraction_once(), 0.0);
        assert_eq!(progress.fraction_complete(), 0.0);
    }

    #[test]
    fn progress_counts_catalog_images_only() {
        let events = [
            LabelEvent::new("A", "img1", Vec::new()),
            LabelEvent::new("B", "img1", Vec::new()),
            LabelEvent::new("A", "gone.jpg", Vec::new()),
        ];
        let index = CoverageIndex::compute(&events);
        let catalog = vec!["img1".to_string(), "img2".to_string()];
        let progress = Progress::compute(&catalog, &index);
        assert_eq!(progress.labeled_once, 1);
        assert_eq!(progress.labeled_complete, 1);
        assert_eq!(progress.fraction_once(), 0.5);
    }

    #[test]
    fn rank_orders_by_count_then_name() {
        let events = [
            LabelEvent::new("zoe", "img1", Vec::new()),
            LabelEvent::new("zoe", "img2", Vec::new()),
            LabelEvent::new("bob", "img1", Vec::new()),
            LabelEvent::new("amy", "img3", Vec::new()),
        ];
        assert_eq!(
            UserStats::compute(&events, "zoe"),
            UserStats {
                total_labeled: 2,
                rank: Some(1)
            }
        );
        assert_eq!(UserStats::compute(&events, "amy").rank, Some(2));
        assert_eq!(UserStats::compute(&events, "bob").rank, Some(3));
        assert_eq!(
            UserStats::compute(&events, "nobody"),
            UserStats {
                total_labeled: 0,
                rank: None
            }
        );
    }
}
