//! Content-addressed memoization of JSON extraction.
//!
//! Keyed by the [`Digest`] of the exact bytes that were parsed, so the same
//! JSON blob or response body recurring across many exchanges is only
//! traversed once. Entries are deterministic for their digest: a hit and a
//! recomputation always agree.
//!
//! Available implementations:
//! - [`MemoryCache`] - unbounded sharded map, lives as long as the collector
//! - [`BoundedCache`] - size-bounded, TinyLFU admission

pub mod bounded;
pub mod memory;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::buckets::ValueMultimap;
use crate::types::digest::Digest;

pub use bounded::BoundedCache;
pub use memory::MemoryCache;

/// JSON keys and key/value pairs found in one payload.
///
/// Never mutated once cached; shared between callers as `Arc<CacheEntry>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub json_keys: BTreeSet<String>,
    pub json_values: ValueMultimap,
}

impl CacheEntry {
    pub fn new(json_keys: BTreeSet<String>, json_values: ValueMultimap) -> Self {
        Self {
            json_keys,
            json_values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.json_keys.is_empty() && self.json_values.is_empty()
    }
}

/// Thread-safe digest → entry map.
///
/// Concurrent misses on the same digest may both compute and both `put`;
/// whichever write lands last is kept. Callers never lock.
pub trait ContentCache: Send + Sync {
    /// Non-blocking lookup.
    fn get(&self, digest: &Digest) -> Option<Arc<CacheEntry>>;

    /// Insert or overwrite.
    fn put(&self, digest: Digest, entry: Arc<CacheEntry>);

    /// Number of cached entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ContentCache + ?Sized> ContentCache for Arc<T> {
    fn get(&self, digest: &Digest) -> Option<Arc<CacheEntry>> {
        (**self).get(digest)
    }

    fn put(&self, digest: Digest, entry: Arc<CacheEntry>) {
        (**self).put(digest, entry)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Build the cache a configuration asks for.
pub fn from_capacity(capacity: Option<u64>) -> Arc<dyn ContentCache> {
    match capacity {
        Some(capacity) => Arc::new(BoundedCache::new(capacity)),
        None => Arc::new(MemoryCache::new()),
    }
}
