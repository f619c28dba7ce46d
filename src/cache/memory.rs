//! Memory Store Module
//!
//! Cost-bounded in-memory store combining HashMap storage with LRU tracking.
//!
//! The budget caps the *sum of entry costs* rather than the entry count. For
//! images the cost is the pixel count, so one large image can push out many
//! thumbnails.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheStats, LruTracker, MemoryEntry, PixelWeigher, Weigher};

// == Memory Store ==
/// In-memory store with cost-based LRU eviction.
///
/// Not synchronised on its own; wrap it in a mutex to share it. Eviction runs
/// synchronously inside [`MemoryStore::put`].
#[derive(Debug)]
pub struct MemoryStore<V, W = PixelWeigher> {
    /// Key-value storage
    entries: HashMap<String, MemoryEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Cost function
    weigher: W,
    /// Sum of all entry costs
    total_cost: u64,
    /// Maximum total cost, 0 = unlimited
    budget: u64,
}

impl<V, W: Weigher<V> + Default> MemoryStore<V, W> {
    // == Constructor ==
    /// Creates a new MemoryStore with the given budget and the default weigher.
    ///
    /// # Arguments
    /// * `budget` - Maximum total cost before eviction kicks in, 0 = unlimited
    pub fn new(budget: u64) -> Self {
        Self::with_weigher(budget, W::default())
    }
}

impl<V, W: Weigher<V>> MemoryStore<V, W> {
    /// Creates a new MemoryStore with a custom cost function.
    pub fn with_weigher(budget: u64, weigher: W) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            weigher,
            total_cost: 0,
            budget,
        }
    }

    // == Put ==
    /// Stores a value, replacing any previous value under the same key.
    ///
    /// The key becomes the most recently used, then least recently used
    /// entries are evicted until the total cost fits the budget. A lone entry
    /// is kept even if it exceeds the budget by itself.
    ///
    /// Returns the keys evicted by this call, oldest first.
    pub fn put(&mut self, key: impl Into<String>, value: Arc<V>) -> Vec<String> {
        let key = key.into();
        let cost = self.weigher.weigh(&value);

        if let Some(previous) = self.entries.insert(key.clone(), MemoryEntry::new(value, cost)) {
            self.total_cost -= previous.cost;
        }
        self.total_cost += cost;
        self.lru.touch(&key);

        self.evict_over_budget()
    }

    fn evict_over_budget(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        if self.budget == 0 {
            return evicted;
        }

        while self.total_cost > self.budget && self.entries.len() > 1 {
            let Some(oldest) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.total_cost -= entry.cost;
                self.stats.record_eviction();
                debug!(key = %oldest, cost = entry.cost, total_cost = self.total_cost, "evicted from memory");
            }
            evicted.push(oldest);
        }
        evicted
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<Arc<V>> {
        match self.entries.get(key) {
            Some(entry) => {
                let value = Arc::clone(&entry.value);
                self.stats.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Retrieves a value without touching recency or statistics.
    pub fn peek(&self, key: &str) -> Option<Arc<V>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    /// Returns true if the key is present, without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Arc<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.total_cost -= entry.cost;
        Some(entry.value)
    }

    /// Removes every entry.
    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.total_cost = 0;
    }

    // == Budget ==
    /// Returns the current budget, 0 = unlimited.
    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Changes the budget. Existing entries are left alone until the next `put`.
    pub fn set_budget(&mut self, budget: u64) {
        self.budget = budget;
    }

    /// Returns the sum of all entry costs.
    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }

    // == Stats ==
    /// Returns current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.total_cost = self.total_cost;
        stats.budget = self.budget;
        stats
    }

    /// Returns `(key, cost, age_ms)` for every entry, least recently used first.
    pub fn usage(&self) -> Vec<(String, u64, u64)> {
        self.lru
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|entry| (key.clone(), entry.cost, entry.age_ms()))
            })
            .collect()
    }

    /// Returns keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.iter().cloned().collect()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
