//! Usage Report Task
//!
//! Background task that periodically logs memory cache usage.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::UrlCache;

/// Spawns a background task that logs memory cache usage every
/// `interval_secs` seconds.
///
/// The task only reads statistics; eviction always happens inline with
/// stores, never here.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval_secs` - Interval in seconds between reports, must be > 0
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(UrlCache::new(CacheConfig::default())?);
/// let report_handle = spawn_usage_report_task(cache.clone(), 60);
/// // Later, during shutdown:
/// report_handle.abort();
/// ```
pub fn spawn_usage_report_task(cache: Arc<UrlCache>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting memory usage report task with interval of {} seconds",
            interval.as_secs()
        );

        let mut last_reported = None;
        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.stats();
            let snapshot = (stats.total_entries, stats.total_cost, stats.hits, stats.misses);

            // Nothing stored, evicted, or read since the last report.
            if last_reported == Some(snapshot) {
                debug!("Memory usage unchanged since last report");
                continue;
            }
            cache.log_memory_usage();
            last_reported = Some(snapshot);
        }
    })
}
