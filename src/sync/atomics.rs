//! Atomic helpers for statistics counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// A relaxed atomic counter for statistics.
///
/// Bumped outside the locks it describes; readers only ever see a snapshot.
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    /// Create a counter at zero.
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter.
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}
