//! Memory Entry Module
//!
//! Defines the structure of a single memory store entry.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// == Memory Entry ==
/// A value held by the memory store together with its budget cost.
#[derive(Debug)]
pub struct MemoryEntry<V: ?Sized> {
    /// The stored value, shared with any caller holding a returned handle
    pub value: Arc<V>,
    /// Cost charged against the store's budget
    pub cost: u64,
    /// Insertion timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl<V: ?Sized> MemoryEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: Arc<V>, cost: u64) -> Self {
        Self {
            value,
            cost,
            stored_at: current_timestamp_ms(),
        }
    }

    /// Milliseconds since the entry was stored.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.stored_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds, or 0 if the clock is
/// before the epoch.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
