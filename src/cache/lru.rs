//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for memory store eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch stamps the key with a fresh, strictly increasing tick:
/// - Smallest tick = Least recently used
/// - Largest tick = Most recently used
///
/// Ticks never repeat, so two keys can never tie and entries inserted without
/// intervening access come out in insertion order.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Keys ordered by the tick of their last access
    order: BTreeMap<u64, String>,
    /// Last-access tick per key
    ticks: HashMap<String, u64>,
    /// Next tick to hand out
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(old) => {
                if let Some(owned) = self.order.remove(&*old) {
                    self.order.insert(tick, owned);
                }
                *old = tick;
            }
            None => {
                self.order.insert(tick, key.to_string());
                self.ticks.insert(key.to_string(), tick);
            }
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.values().next()
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.values()
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.order.clear();
        self.ticks.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}
