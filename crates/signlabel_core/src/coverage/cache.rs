//! Explicit time-bounded memo for the coverage index.
//!
//! Callers pass `now` in and decide when to refresh; nothing here reads
//! the clock. A cached value may lag behind the store by up to `ttl`
//! unless the caller invalidates it after its own writes.

use super::index::CoverageIndex;
use std::time::{Duration, Instant};

/// Default staleness window.
pub const DEFAULT_COVERAGE_TTL: Duration = Duration::from_secs(120);

/// Staleness policy: never computed, or at least `ttl` old.
pub fn is_stale(now: Instant, last_computed_at: Option<Instant>, ttl: Duration) -> bool {
    match last_computed_at {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= ttl,
    }
}

/// `(last_computed_at, cached)` pair plus its TTL.
#[derive(Debug, Clone)]
pub struct CoverageCache {
    ttl: Duration,
    last_computed_at: Option<Instant>,
    cached: CoverageIndex,
}

impl Default for CoverageCache {
    fn default() -> Self {
        Self::new(DEFAULT_COVERAGE_TTL)
    }
}

impl CoverageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_computed_at: None,
            cached: CoverageIndex::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn last_computed_at(&self) -> Option<Instant> {
        self.last_computed_at
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        is_stale(now, self.last_computed_at, self.ttl)
    }

    /// Forces the next `get_or_refresh` to recompute.
    pub fn invalidate(&mut self) {
        self.last_computed_at = None;
    }

    /// Returns the cached index, recomputing it first when stale.
    ///
    /// A failed recompute leaves the previous value and timestamp untouched.
    pub fn get_or_refresh<E>(
        &mut self,
        now: Instant,
        compute: impl FnOnce() -> Result<CoverageIndex, E>,
    ) -> Result<&CoverageIndex, E> {
        if self.is_stale(now) {
            self.cached = compute()?;
            self.last_computed_at = Some(now);
        }
        Ok(&self.cached)
    }
}
