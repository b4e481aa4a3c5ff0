//! Per-key fixed-window counters.
//!
//! Backs the rate limiter. Counters are process-local and non-durable: a
//! restart clears them, and limits are per-process unless the store is
//! replaced by a shared backend.

use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::clock::Clock;

/// A single fixed-window counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowCounter {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Concurrent map of per-key fixed-window counters.
///
/// Each key's read-modify-write happens under that entry's lock, so
/// concurrent increments for the same key never lose updates while distinct
/// keys do not contend.
pub struct CounterStore<K: Eq + Hash> {
    counters: DashMap<K, WindowCounter>,
    clock: Arc<dyn Clock>,
}

impl<K: Eq + Hash + Clone> CounterStore<K> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            clock,
        }
    }

    /// Increments the counter for `key` and returns the new count.
    ///
    /// The window resets exactly when `now - window_start >= window`; the
    /// counter is created lazily on first use.
    pub fn increment(&self, key: K, window: Duration) -> u32 {
        let now = self.clock.now();
        let mut entry = self.counters.entry(key).or_insert(WindowCounter {
            count: 0,
            window_start: now,
        });

        if now - entry.window_start >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count
    }

    /// Current count for `key` within the active window, 0 for an unknown
    /// key or an elapsed window. Read-only.
    pub fn count(&self, key: &K, window: Duration) -> u32 {
        let now = self.clock.now();
        match self.counters.get(key) {
            Some(entry) if now - entry.window_start < window => entry.count,
            _ => 0,
        }
    }

    /// Time left until the window for `key` resets, `None` for an unknown
    /// key or an already-elapsed window.
    pub fn remaining_window(&self, key: &K, window: Duration) -> Option<Duration> {
        let now = self.clock.now();
        let entry = self.counters.get(key)?;
        let elapsed = now - entry.window_start;
        if elapsed < window {
            Some(window - elapsed)
        } else {
            None
        }
    }

    /// Removes the counter for `key`.
    pub fn clear(&self, key: &K) {
        self.counters.remove(key);
    }

    /// Removes all counters.
    pub fn clear_all(&self) {
        self.counters.clear();
    }
}
