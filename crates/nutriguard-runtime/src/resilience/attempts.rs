//! Per-operation attempt counts.
//!
//! Each operation key has its own counter so unrelated operations never
//! affect each other. Entries are created on first failure, reset to zero on
//! success, and never removed: the set of keys an application uses is small
//! and fixed.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Attempt counts keyed by operation.
///
/// Every read-modify-write happens under the write lock, so concurrent
/// invocations sharing a key never lose an increment.
#[derive(Debug, Default)]
pub struct AttemptRegistry {
    counts: RwLock<HashMap<String, u32>>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt and return the updated count.
    pub fn record_failure(&self, key: &str) -> u32 {
        let mut counts = self.counts.write();
        let count = counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Reset the counter for `key` to zero.
    pub fn reset(&self, key: &str) {
        let mut counts = self.counts.write();
        if let Some(count) = counts.get_mut(key) {
            *count = 0;
        }
    }

    /// Current count for `key`. Unknown keys read as zero.
    pub fn attempts(&self, key: &str) -> u32 {
        self.counts.read().get(key).copied().unwrap_or(0)
    }

    /// Reset every counter to zero.
    pub fn reset_all(&self) {
        for count in self.counts.write().values_mut() {
            *count = 0;
        }
    }

    /// Copy of all counters.
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.counts.read().clone()
    }
}
