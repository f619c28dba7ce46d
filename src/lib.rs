//! URL Cache - A two-tier cache for URL-addressed payloads
//!
//! Keeps decoded images in memory under a pixel budget with LRU eviction, and
//! raw bytes on disk with modification-time based invalidation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CachedData, UrlCache};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_usage_report_task;
