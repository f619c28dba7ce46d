//! Shared Cache Module
//!
//! A process-wide [`UrlCache`] for callers that cannot have one passed in.
//!
//! Prefer constructing a cache at startup and handing out `Arc` clones; the
//! server binary does exactly that. The shared slot is built lazily with the
//! default configuration on first access and can be replaced at any time.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::info;

use crate::cache::UrlCache;

static SHARED: OnceLock<RwLock<Arc<UrlCache>>> = OnceLock::new();

fn slot() -> &'static RwLock<Arc<UrlCache>> {
    SHARED.get_or_init(|| RwLock::new(Arc::new(UrlCache::default())))
}

/// Returns the shared cache, creating it on first use.
pub fn shared_cache() -> Arc<UrlCache> {
    slot().read().clone()
}

/// Replaces the shared cache and returns the previous one.
///
/// Holders of the previous instance keep using it until they drop their
/// handles; releasing its resources is up to the caller.
pub fn set_shared_cache(cache: Arc<UrlCache>) -> Arc<UrlCache> {
    info!("Replacing shared URL cache");
    std::mem::replace(&mut *slot().write(), cache)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use tempfile::TempDir;

    // Both assertions share one test so parallel tests never observe a
    // half-swapped slot.
    #[test]
    fn test_shared_cache_lazily_created_and_replaceable() {
        let first = shared_cache();
        assert!(Arc::ptr_eq(&first, &shared_cache()));

        let dir = TempDir::new().unwrap();
        let replacement = Arc::new(
            UrlCache::new(CacheConfig {
                cache_path: dir.path().to_path_buf(),
                ..CacheConfig::default()
            })
            .unwrap(),
        );

        let previous = set_shared_cache(Arc::clone(&replacement));

        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&shared_cache(), &replacement));
        assert_eq!(shared_cache().cache_path(), dir.path());

        set_shared_cache(previous);
    }
}
