//! URL Cache Module
//!
//! The public face of the cache: URL- and key-addressed reads, writes,
//! removal and invalidation across the memory and disk stores.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use image::DynamicImage;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::key::{disk_path_for_key, key_for_url, temporary_url};
use crate::cache::{CacheStats, CachedImage, DiskStore, FsDiskStore, MemoryStore};
use crate::config::{age_from_secs, CacheConfig};
use crate::error::{CacheError, Result};

// == Cached Data ==
/// Bytes read from the disk cache and the time they were last written or
/// invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedData {
    pub bytes: Vec<u8>,
    pub timestamp: SystemTime,
}

impl CachedData {
    /// The timestamp as UTC wall-clock time.
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.timestamp)
    }
}

/// Runtime-mutable settings. The budget lives in the memory store itself.
#[derive(Debug, Clone)]
struct Settings {
    cache_path: PathBuf,
    invalidation_age: Duration,
    disk_cache_enabled: bool,
    image_cache_enabled: bool,
}

// == URL Cache ==
/// Two-tier cache for URL-addressed payloads.
///
/// Share it as `Arc<UrlCache>`; every method takes `&self`. Disk methods block
/// on the filesystem, so async callers should run them on a blocking pool.
///
/// Memory and disk are independent: an image in memory says nothing about
/// the bytes on disk for the same URL, and vice versa.
pub struct UrlCache<I: CachedImage = DynamicImage> {
    settings: RwLock<Settings>,
    memory: Mutex<MemoryStore<I>>,
    disk: Box<dyn DiskStore>,
}

impl<I: CachedImage> UrlCache<I> {
    // == Constructors ==
    /// Creates a cache backed by the filesystem.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_disk_store(config, Box::new(FsDiskStore::new()))
    }

    /// Creates a cache with a custom disk backend.
    pub fn with_disk_store(config: CacheConfig, disk: Box<dyn DiskStore>) -> Result<Self> {
        config.validate()?;
        if let Err(err) = std::fs::create_dir_all(&config.cache_path) {
            warn!(
                path = %config.cache_path.display(),
                error = %err,
                "could not create disk cache root, will retry on first write"
            );
        }
        info!(
            "URL cache created: path={}, max_pixel_count={}, invalidation_age={:?}, disk={}, images={}",
            config.cache_path.display(),
            config.max_pixel_count,
            config.invalidation_age,
            config.disk_cache_enabled,
            config.image_cache_enabled
        );
        Ok(Self::from_parts(config, disk))
    }

    fn from_parts(config: CacheConfig, disk: Box<dyn DiskStore>) -> Self {
        Self {
            settings: RwLock::new(Settings {
                cache_path: config.cache_path,
                invalidation_age: config.invalidation_age,
                disk_cache_enabled: config.disk_cache_enabled,
                image_cache_enabled: config.image_cache_enabled,
            }),
            memory: Mutex::new(MemoryStore::new(config.max_pixel_count)),
            disk,
        }
    }

    // == Configuration ==
    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> CacheConfig {
        let settings = self.settings.read();
        CacheConfig {
            cache_path: settings.cache_path.clone(),
            max_pixel_count: self.memory.lock().budget(),
            invalidation_age: settings.invalidation_age,
            disk_cache_enabled: settings.disk_cache_enabled,
            image_cache_enabled: settings.image_cache_enabled,
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.settings.read().cache_path.clone()
    }

    /// Points the disk cache at a new root. Entries under the old root are
    /// left where they are.
    pub fn set_cache_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "cache path cannot be empty".to_string(),
            ));
        }
        self.settings.write().cache_path = path;
        Ok(())
    }

    pub fn max_pixel_count(&self) -> u64 {
        self.memory.lock().budget()
    }

    /// Changes the memory budget, 0 = unlimited. Takes effect on the next store.
    pub fn set_max_pixel_count(&self, max_pixel_count: u64) {
        self.memory.lock().set_budget(max_pixel_count);
    }

    pub fn invalidation_age(&self) -> Duration {
        self.settings.read().invalidation_age
    }

    pub fn set_invalidation_age(&self, age: Duration) {
        self.settings.write().invalidation_age = age;
    }

    /// Sets the invalidation age from seconds, rejecting negative or
    /// non-finite values.
    pub fn set_invalidation_age_secs(&self, secs: f64) -> Result<()> {
        let age = age_from_secs(secs)?;
        self.set_invalidation_age(age);
        Ok(())
    }

    pub fn disk_cache_enabled(&self) -> bool {
        self.settings.read().disk_cache_enabled
    }

    pub fn set_disk_cache_enabled(&self, enabled: bool) {
        self.settings.write().disk_cache_enabled = enabled;
    }

    pub fn image_cache_enabled(&self) -> bool {
        self.settings.read().image_cache_enabled
    }

    pub fn set_image_cache_enabled(&self, enabled: bool) {
        self.settings.write().image_cache_enabled = enabled;
    }

    // == Keys and Paths ==
    /// Returns the key a URL is cached under.
    pub fn key_for_url(&self, url: &str) -> String {
        key_for_url(url)
    }

    /// Returns the path where a URL's bytes are (or would be) stored.
    pub fn cache_path_for_url(&self, url: &str) -> PathBuf {
        self.cache_path_for_key(&key_for_url(url))
    }

    /// Returns the path where a key's bytes are (or would be) stored.
    pub fn cache_path_for_key(&self, key: &str) -> PathBuf {
        disk_path_for_key(&self.settings.read().cache_path, key)
    }

    /// The path to use for disk reads and writes, or `None` if the disk cache
    /// is disabled.
    fn enabled_disk_path(&self, key: &str) -> Option<PathBuf> {
        let settings = self.settings.read();
        settings
            .disk_cache_enabled
            .then(|| disk_path_for_key(&settings.cache_path, key))
    }

    // == Lookups ==
    /// Returns true if an image is in memory or bytes exist on disk for the
    /// URL, whatever their age.
    pub fn has_data_for_url(&self, url: &str) -> bool {
        self.has_data_for_key(&key_for_url(url))
    }

    pub fn has_data_for_key(&self, key: &str) -> bool {
        if self.image_cache_enabled() && self.memory.lock().contains(key) {
            return true;
        }
        self.enabled_disk_path(key)
            .is_some_and(|path| self.disk.exists(&path))
    }

    /// Reads the bytes cached for a URL.
    ///
    /// `expires` is the oldest acceptable age; `None` or zero never expires.
    /// Always `None` while the disk cache is disabled.
    pub fn data_for_url(&self, url: &str, expires: Option<Duration>) -> Option<CachedData> {
        self.data_for_key(&key_for_url(url), expires)
    }

    pub fn data_for_key(&self, key: &str, expires: Option<Duration>) -> Option<CachedData> {
        let path = self.enabled_disk_path(key)?;
        let (bytes, timestamp) = self.disk.read_if_fresh(&path, expires)?;
        Some(CachedData { bytes, timestamp })
    }

    /// Returns the decoded image held in memory for a URL. Never reads disk.
    pub fn image_for_url(&self, url: &str) -> Option<Arc<I>> {
        self.image_for_key(&key_for_url(url))
    }

    pub fn image_for_key(&self, key: &str) -> Option<Arc<I>> {
        if !self.image_cache_enabled() {
            return None;
        }
        self.memory.lock().get(key)
    }

    // == Stores ==
    /// Writes bytes for a URL to disk. A failed write is logged and dropped.
    pub fn store_data_for_url(&self, bytes: &[u8], url: &str) {
        self.store_data_for_key(bytes, &key_for_url(url));
    }

    pub fn store_data_for_key(&self, bytes: &[u8], key: &str) {
        let Some(path) = self.enabled_disk_path(key) else {
            return;
        };
        match self.disk.write(&path, bytes) {
            Ok(()) => debug!(key, len = bytes.len(), "stored data on disk"),
            Err(err) => warn!(key, path = %path.display(), error = %err, "failed to store data on disk"),
        }
    }

    /// Keeps a decoded image in memory for a URL.
    pub fn store_image_for_url(&self, image: impl Into<Arc<I>>, url: &str) {
        self.store_image_for_key(image, &key_for_url(url));
    }

    pub fn store_image_for_key(&self, image: impl Into<Arc<I>>, key: &str) {
        if !self.image_cache_enabled() {
            return;
        }
        let evicted = self.memory.lock().put(key, image.into());
        if !evicted.is_empty() {
            debug!(key, evicted = evicted.len(), "memory budget exceeded, evicted older images");
        }
    }

    /// Caches an image under a fresh temporary URL and returns that URL.
    ///
    /// With `to_disk`, the image is also encoded and written to disk so it
    /// can later be moved to its permanent URL with [`UrlCache::move_data`].
    pub fn store_temporary_image(&self, image: impl Into<Arc<I>>, to_disk: bool) -> String {
        let url = temporary_url();
        let image = image.into();
        if to_disk {
            match image.encode() {
                Some(bytes) => self.store_data_for_url(&bytes, &url),
                None => warn!(url = %url, "temporary image could not be encoded for disk"),
            }
        }
        self.store_image_for_url(image, &url);
        url
    }

    /// Writes bytes to disk under a fresh temporary URL and returns that URL.
    pub fn store_temporary_data(&self, bytes: &[u8]) -> String {
        let url = temporary_url();
        self.store_data_for_url(bytes, &url);
        url
    }

    // == Move ==
    /// Moves the disk entry for `old_url` to `new_url`, replacing whatever
    /// was there.
    ///
    /// Only the disk entry moves. A memory image stored under `old_url` stays
    /// under `old_url`; re-store it under `new_url` if it is needed there.
    pub fn move_data(&self, old_url: &str, new_url: &str) {
        let (from, to) = {
            let settings = self.settings.read();
            (
                disk_path_for_key(&settings.cache_path, &key_for_url(old_url)),
                disk_path_for_key(&settings.cache_path, &key_for_url(new_url)),
            )
        };
        if let Err(err) = self.disk.move_entry(&from, &to) {
            warn!(old_url, new_url, error = %err, "failed to move cached data");
        }
    }

    // == Removal ==
    /// Drops the memory entry for a URL, and the disk entry too if `from_disk`.
    pub fn remove_url(&self, url: &str, from_disk: bool) {
        let key = key_for_url(url);
        self.memory.lock().remove(&key);
        if from_disk {
            self.remove_disk_entry(&key);
        }
    }

    /// Drops both the memory and disk entries for a key.
    pub fn remove_key(&self, key: &str) {
        self.memory.lock().remove(key);
        self.remove_disk_entry(key);
    }

    fn remove_disk_entry(&self, key: &str) {
        let path = self.cache_path_for_key(key);
        if let Err(err) = self.disk.remove(&path) {
            warn!(key, path = %path.display(), error = %err, "failed to remove cached data");
        }
    }

    /// Empties the memory cache, and the whole disk cache if `from_disk`.
    pub fn remove_all(&self, from_disk: bool) {
        self.memory.lock().remove_all();
        if from_disk {
            let root = self.cache_path();
            if let Err(err) = self.disk.remove_all(&root) {
                warn!(root = %root.display(), error = %err, "failed to erase disk cache");
            }
        }
        info!("URL cache cleared (from_disk={})", from_disk);
    }

    // == Invalidation ==
    /// Backdates a URL's disk entry by the invalidation age so the next read
    /// with a normal expiration age treats it as stale. The bytes are kept.
    pub fn invalidate_url(&self, url: &str) {
        self.invalidate_key(&key_for_url(url));
    }

    pub fn invalidate_key(&self, key: &str) {
        let (path, age) = {
            let settings = self.settings.read();
            (
                disk_path_for_key(&settings.cache_path, key),
                settings.invalidation_age,
            )
        };
        if let Err(err) = self.disk.invalidate(&path, age) {
            warn!(key, path = %path.display(), error = %err, "failed to invalidate cached data");
        }
    }

    /// Backdates every disk entry by the invalidation age.
    pub fn invalidate_all(&self) {
        let (root, age) = {
            let settings = self.settings.read();
            (settings.cache_path.clone(), settings.invalidation_age)
        };
        match self.disk.invalidate_all(&root, age) {
            Ok(count) => info!("Invalidated {} disk cache entries", count),
            Err(err) => warn!(root = %root.display(), error = %err, "failed to invalidate disk cache"),
        }
    }

    // == Diagnostics ==
    /// Returns memory store statistics.
    pub fn stats(&self) -> CacheStats {
        self.memory.lock().stats()
    }

    /// Logs every memory entry, least recently used first, plus totals.
    pub fn log_memory_usage(&self) {
        let (usage, stats) = {
            let memory = self.memory.lock();
            (memory.usage(), memory.stats())
        };
        for (key, cost, age_ms) in &usage {
            debug!(key = %key, pixels = cost, age_ms, "memory cache entry");
        }
        info!(
            "Memory cache usage: entries={}, pixels={}, budget={}, hits={}, misses={}, evictions={}",
            stats.total_entries,
            stats.total_cost,
            stats.budget,
            stats.hits,
            stats.misses,
            stats.evictions
        );
    }

    /// Returns true if a memory entry exists for a URL, without touching its
    /// recency. Always false while the image cache is disabled.
    pub fn has_image_for_url(&self, url: &str) -> bool {
        self.image_cache_enabled() && self.memory.lock().contains(&key_for_url(url))
    }
}

impl<I: CachedImage> Default for UrlCache<I> {
    /// A filesystem-backed cache with the default configuration.
    fn default() -> Self {
        Self::from_parts(CacheConfig::default(), Box::new(FsDiskStore::new()))
    }
}
