//! Size-bounded content cache (Moka, TinyLFU admission).

use moka::sync::Cache;
use std::sync::Arc;

use super::{CacheEntry, ContentCache};
use crate::types::digest::Digest;

/// Content cache that holds at most `capacity` entries.
///
/// Opt-in alternative to [`MemoryCache`](super::MemoryCache) for long-lived
/// proxies; evicted payloads are simply parsed again.
pub struct BoundedCache {
    inner: Cache<Digest, Arc<CacheEntry>>,
}

impl BoundedCache {
    /// Create a new cache with the given capacity.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// Apply pending evictions now. Moka does this lazily.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }
}

impl Default for BoundedCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl ContentCache for BoundedCache {
    fn get(&self, digest: &Digest) -> Option<Arc<CacheEntry>> {
        self.inner.get(digest)
    }

    fn put(&self, digest: Digest, entry: Arc<CacheEntry>) {
        self.inner.insert(digest, entry);
    }

    fn len(&self) -> usize {
        self.inner.entry_count() as usize
    }
}
