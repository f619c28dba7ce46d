//! Configuration Module
//!
//! Handles loading and validating cache and server configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Pixels in a thumbnail-sized image.
const SMALL_IMAGE_PIXELS: u64 = 50 * 50;
/// Pixels in a full-screen-sized image.
const LARGE_IMAGE_PIXELS: u64 = 600 * 400;

/// Default memory budget: roughly twenty thumbnails plus two large images.
pub const DEFAULT_MAX_PIXEL_COUNT: u64 = SMALL_IMAGE_PIXELS * 20 + LARGE_IMAGE_PIXELS * 2;

/// Default amount subtracted from "now" when invalidating a disk entry.
pub const DEFAULT_INVALIDATION_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Directory name used under the platform cache directory.
const CACHE_DIR_NAME: &str = "url_cache";

// == Cache Config ==
/// Settings consulted by [`crate::cache::UrlCache`] on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Root directory of the disk cache
    pub cache_path: PathBuf,
    /// Memory budget in pixels, 0 = unlimited
    pub max_pixel_count: u64,
    /// How far back `invalidate_*` rewinds a file's modification time
    pub invalidation_age: Duration,
    /// Whether raw payloads are written to and read from disk
    pub disk_cache_enabled: bool,
    /// Whether decoded images are kept in memory
    pub image_cache_enabled: bool,
}

impl CacheConfig {
    /// Returns the default disk cache root for this platform.
    ///
    /// Uses the user cache directory when one exists, otherwise the system
    /// temporary directory.
    pub fn default_cache_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join(CACHE_DIR_NAME)
    }

    /// Rejects settings the cache cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_path.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "cache path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_path: Self::default_cache_path(),
            max_pixel_count: DEFAULT_MAX_PIXEL_COUNT,
            invalidation_age: DEFAULT_INVALIDATION_AGE,
            disk_cache_enabled: true,
            image_cache_enabled: true,
        }
    }
}

// == Server Config ==
/// Process configuration for the cache server binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Interval between memory usage reports in seconds, 0 disables them
    pub report_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PATH` - Disk cache root (default: platform cache dir + `url_cache`)
    /// - `MAX_PIXEL_COUNT` - Memory budget in pixels, 0 = unlimited (default: 530000)
    /// - `INVALIDATION_AGE` - Invalidation age in seconds, fractional allowed (default: 86400)
    /// - `DISABLE_DISK_CACHE` - Disable the disk cache (default: false)
    /// - `DISABLE_IMAGE_CACHE` - Disable the memory image cache (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REPORT_INTERVAL` - Memory usage report interval in seconds (default: 60)
    ///
    /// Unset variables fall back to defaults; set but unparsable ones are
    /// rejected with [`CacheError::InvalidConfiguration`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let invalidation_age = match lookup("INVALIDATION_AGE") {
            Some(raw) => parse_age(&raw)?,
            None => defaults.cache.invalidation_age,
        };

        let cache = CacheConfig {
            cache_path: lookup("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache.cache_path),
            max_pixel_count: parse_var(&lookup, "MAX_PIXEL_COUNT", defaults.cache.max_pixel_count)?,
            invalidation_age,
            disk_cache_enabled: !parse_flag(&lookup, "DISABLE_DISK_CACHE")?,
            image_cache_enabled: !parse_flag(&lookup, "DISABLE_IMAGE_CACHE")?,
        };
        cache.validate()?;

        Ok(Self {
            cache,
            server_port: parse_var(&lookup, "SERVER_PORT", defaults.server_port)?,
            report_interval: parse_var(&lookup, "REPORT_INTERVAL", defaults.report_interval)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            report_interval: 60,
        }
    }
}

/// Parses an age in (possibly fractional) seconds.
///
/// Negative, NaN, and out-of-range values are rejected.
pub fn parse_age(raw: &str) -> Result<Duration> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        CacheError::InvalidConfiguration(format!("age '{}' is not a number", raw))
    })?;
    age_from_secs(secs)
}

/// Converts seconds to a Duration, rejecting negative and non-finite values.
pub fn age_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        CacheError::InvalidConfiguration(format!("age {} must be finite and >= 0", secs))
    })
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            CacheError::InvalidConfiguration(format!("{} has invalid value '{}'", name, raw))
        }),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<bool> {
    match lookup(name).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => Err(CacheError::InvalidConfiguration(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
