//! In-process label store.
//!
//! Stands in for a hosted table store: same append/snapshot contract,
//! nothing durable. Used by tests and dry runs.

use crate::model::label::{LabelEvent, LabelId, StoredLabel};
use crate::repo::label_repo::{LabelStore, RepoResult};
use std::cell::RefCell;

/// Vector-backed label store with sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct MemoryLabelStore {
    rows: RefCell<Vec<StoredLabel>>,
}

impl MemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store, assigning ids in iteration order.
    pub fn with_events(events: impl IntoIterator<Item = LabelEvent>) -> RepoResult<Self> {
        let store = Self::new();
        for event in events {
            store.insert(&event)?;
        }
        Ok(store)
    }
}

impl LabelStore for MemoryLabelStore {
    fn insert(&self, event: &LabelEvent) -> RepoResult<LabelId> {
        event.validate()?;
        let mut rows = self.rows.borrow_mut();
        let id = rows.len() as LabelId + 1;
        rows.push(StoredLabel {
            id,
            event: event.clone(),
        });
        Ok(id)
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.rows.borrow().len() as u64)
    }

    fn select_page(&self, offset: u64, limit: u32) -> RepoResult<Vec<StoredLabel>> {
        let rows = self.rows.borrow();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(rows.len());
        let end = start.saturating_add(limit as usize).min(rows.len());
        Ok(rows[start..end].to_vec())
    }
}
