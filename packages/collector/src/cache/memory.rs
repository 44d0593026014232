//! Unbounded in-memory content cache.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{CacheEntry, ContentCache};
use crate::types::digest::Digest;

/// Sharded concurrent map with no eviction.
///
/// Readers and writers on different digests never block each other. Grows
/// for the life of the owning collector.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<Digest, Arc<CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookups that found an entry.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl ContentCache for MemoryCache {
    fn get(&self, digest: &Digest) -> Option<Arc<CacheEntry>> {
        // Clone the Arc out so the shard guard is released immediately
        let found = self.entries.get(digest).map(|e| Arc::clone(e.value()));
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn put(&self, digest: Digest, entry: Arc<CacheEntry>) {
        self.entries.insert(digest, entry);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
