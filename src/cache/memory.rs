//! In-process LRU tier of the image cache.
//!
//! Entries are evicted least-recently-used first once the total size of the
//! encoded bytes exceeds capacity or the entry bound is reached.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::RwLock;

use super::key::CacheKey;
use super::CachedImage;

/// Size-bounded LRU cache of encoded images.
pub struct MemoryCache {
    /// Entries and their running byte total, updated together
    inner: RwLock<Inner>,

    /// Maximum total size in bytes
    max_size: usize,
}

struct Inner {
    entries: LruCache<CacheKey, CachedImage>,
    current_size: usize,
}

impl MemoryCache {
    /// Create a memory tier bounded by `max_size` bytes and `max_entries` entries.
    ///
    /// A `max_entries` of zero is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(Inner {
                entries: LruCache::new(max_entries),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// Get an entry, marking it as recently used.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedImage> {
        let mut inner = self.inner.write().await;
        inner.entries.get(key).cloned()
    }

    /// Check for an entry without updating LRU order.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.inner.read().await.entries.contains(key)
    }

    /// Insert or replace an entry, then evict until within capacity.
    ///
    /// An entry larger than the whole capacity is not retained.
    pub async fn put(&self, key: CacheKey, image: CachedImage) {
        let size = image.bytes.len();
        let mut inner = self.inner.write().await;

        // push() hands back either the replaced value for this key or the
        // entry evicted by the entry bound; both leave the running total
        if let Some((_, displaced)) = inner.entries.push(key, image) {
            inner.current_size = inner.current_size.saturating_sub(displaced.bytes.len());
        }
        inner.current_size += size;

        while inner.current_size > self.max_size {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => {
                    inner.current_size = inner.current_size.saturating_sub(evicted.bytes.len());
                }
                None => break,
            }
        }
    }

    /// Remove an entry, returning it if present.
    pub async fn remove(&self, key: &CacheKey) -> Option<CachedImage> {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.pop(key)?;
        inner.current_size = inner.current_size.saturating_sub(removed.bytes.len());
        Some(removed)
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.current_size = 0;
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the tier holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Total size of cached bytes.
    pub async fn size(&self) -> usize {
        self.inner.read().await.current_size
    }

    /// Maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

// =============================================================================
// Tests
// =============================================================================
