//! Per-URL debounce state
//!
//! Remembers when each webhook URL last received a successful delivery. The
//! map is keyed by URL alone, so entries for different identifiers that
//! target the same URL share one gate. Failed deliveries never touch it.
//!
//! The lock here is independent of the IP registry's lock and the two are
//! never held together.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// URL → time of last successful delivery
#[derive(Debug, Default)]
pub struct DebounceTracker {
    last_sent: RwLock<HashMap<String, Instant>>,
}

impl DebounceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a delivery to `url` should be skipped right now
    pub fn should_skip(&self, url: &str, interval: Duration) -> bool {
        self.should_skip_at(url, interval, Instant::now())
    }

    /// Whether a delivery to `url` at `now` falls inside `interval` of the
    /// last successful one
    pub fn should_skip_at(&self, url: &str, interval: Duration, now: Instant) -> bool {
        let guard = self
            .last_sent
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.get(url) {
            Some(last) => now.saturating_duration_since(*last) < interval,
            None => false,
        }
    }

    /// Record a successful delivery to `url` now
    pub fn record_success(&self, url: &str) {
        self.record_success_at(url, Instant::now());
    }

    /// Record a successful delivery to `url` at `at`
    pub fn record_success_at(&self, url: &str, at: Instant) {
        let mut guard = self
            .last_sent
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(url.to_string(), at);
    }

    /// Time of the last successful delivery to `url`, if any
    pub fn last_success(&self, url: &str) -> Option<Instant> {
        self.last_sent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
    }
}
