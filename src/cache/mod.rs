//! Cache Module
//!
//! Two-tier cache for URL-addressed payloads: decoded images in memory under a
//! pixel budget, raw bytes on disk with modification-time staleness.

mod cached_image;
mod disk;
mod entry;
pub mod key;
mod lru;
mod memory;
pub mod shared;
mod stats;
mod url_cache;


// Re-export public types
pub use cached_image::{CachedImage, PixelWeigher, Weigher};
pub use disk::{DiskStore, FsDiskStore};
pub use entry::MemoryEntry;
pub use key::{is_temporary_url, key_for_url, temporary_url};
pub use lru::LruTracker;
pub use memory::MemoryStore;
pub use stats::CacheStats;
pub use url_cache::{CachedData, UrlCache};
