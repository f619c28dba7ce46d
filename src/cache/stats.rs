//! Cache Statistics Module
//!
//! Tracks memory store metrics including hits, misses, evictions and cost.

use serde::Serialize;

// == Cache Stats ==
/// Tracks memory store performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of failed lookups
    pub misses: u64,
    /// Number of entries evicted to stay within budget
    pub evictions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Current sum of entry costs (pixels for images)
    pub total_cost: u64,
    /// Configured budget, 0 = unlimited
    pub budget: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
