//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `PUT /data` and `POST /temporary`
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// Success message
    pub message: String,
    /// URL the payload is cached under
    pub url: String,
    /// Cache key derived from the URL
    pub key: String,
}

impl StoreResponse {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            message: format!("Data for '{}' stored", url),
            url,
            key: key.into(),
        }
    }
}

/// Response body for `GET /exists`
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub url: String,
    /// True if memory or disk holds an entry, regardless of age
    pub cached: bool,
}

impl ExistsResponse {
    pub fn new(url: impl Into<String>, cached: bool) -> Self {
        Self {
            url: url.into(),
            cached,
        }
    }
}

/// Generic acknowledgement for remove, move and invalidate endpoints
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of memory cache hits
    pub hits: u64,
    /// Number of memory cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of images in memory
    pub total_entries: usize,
    /// Pixels currently held in memory
    pub total_pixels: u64,
    /// Memory budget in pixels, 0 = unlimited
    pub max_pixel_count: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Whether the disk cache is enabled
    pub disk_cache_enabled: bool,
    /// Whether the memory image cache is enabled
    pub image_cache_enabled: bool,
}

impl StatsResponse {
    /// Creates a new StatsResponse from memory store statistics
    pub fn new(stats: &CacheStats, disk_cache_enabled: bool, image_cache_enabled: bool) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            total_pixels: stats.total_cost,
            max_pixel_count: stats.budget,
            hit_rate: stats.hit_rate(),
            disk_cache_enabled,
            image_cache_enabled,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
