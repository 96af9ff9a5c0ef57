//! Two-tier cache of encoded images.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               ImageCache                 │
//! │   lookup(url)            store(url, ..)  │
//! │       │                       │          │
//! │       ▼                       ▼          │
//! │  ┌─────────────┐  miss  ┌─────────────┐  │
//! │  │ MemoryCache │ ─────▶ │  DiskCache  │  │
//! │  │ (LRU, size) │ ◀───── │ (sha256 dir)│  │
//! │  └─────────────┘ promote└─────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Both tiers are addressed by the same [`CacheKey`], built from the URL, the
//! protocol cache policy and the freshness window. Cache failures are never
//! surfaced: a failing lookup is a miss and a failing store is logged.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use netimage::cache::ImageCache;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = ImageCache::in_memory(1024 * 1024);
//!     let url = Url::parse("https://example.com/a.png").unwrap();
//!
//!     cache.store(&url, Bytes::from_static(b"\x89PNG"), Some("image/png".into())).await;
//!
//!     let hit = cache.lookup(&url).await.unwrap();
//!     assert_eq!(&hit.bytes[..], b"\x89PNG");
//! }
//! ```

mod disk;
mod key;
mod memory;

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

use crate::config::{LoaderConfig, DEFAULT_CACHE_MAX_AGE_SECS, DEFAULT_MEMORY_CACHE_ENTRIES};

pub use disk::{DiskCache, DiskEntryMeta};
pub use key::{CacheKey, CachePolicy};
pub use memory::MemoryCache;

/// Encoded image bytes plus the content type they were served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    /// Encoded bytes exactly as fetched
    pub bytes: Bytes,

    /// Content type reported by the server
    pub content_type: Option<String>,
}

impl CachedImage {
    /// Create a cached image value.
    pub fn new(bytes: Bytes, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }
}

// =============================================================================
// Image Cache
// =============================================================================

/// Memory tier in front of an optional persistent tier.
///
/// # Thread Safety
///
/// The cache is `Send + Sync` and meant to be shared across tasks and targets
/// via `Arc`.
pub struct ImageCache {
    memory: MemoryCache,
    disk: Option<DiskCache>,
    max_age: Duration,
}

impl ImageCache {
    /// Memory-only cache with the given byte capacity.
    pub fn in_memory(max_size: usize) -> Self {
        Self {
            memory: MemoryCache::with_capacity_and_entries(max_size, DEFAULT_MEMORY_CACHE_ENTRIES),
            disk: None,
            max_age: Duration::from_secs(DEFAULT_CACHE_MAX_AGE_SECS),
        }
    }

    /// Memory tier backed by a persistent directory.
    pub fn with_disk(max_size: usize, dir: impl Into<PathBuf>) -> Self {
        Self {
            disk: Some(DiskCache::new(dir)),
            ..Self::in_memory(max_size)
        }
    }

    /// Build the cache described by `config`.
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            memory: MemoryCache::with_capacity_and_entries(
                config.memory_cache_bytes,
                config.memory_cache_entries,
            ),
            disk: config.cache_dir.clone().map(DiskCache::new),
            max_age: config.cache_max_age(),
        }
    }

    /// Override the freshness window used for keys.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// The canonical key this cache uses for `url`.
    pub fn key_for(&self, url: &Url) -> CacheKey {
        CacheKey::for_url(url, self.max_age)
    }

    /// Look up `url`, memory tier first.
    ///
    /// A persistent hit is promoted into the memory tier. Errors reading the
    /// persistent tier are logged and reported as a miss.
    pub async fn lookup(&self, url: &Url) -> Option<CachedImage> {
        let key = self.key_for(url);

        if let Some(hit) = self.memory.get(&key).await {
            debug!(url = %url, tier = "memory", "Image cache hit");
            return Some(hit);
        }

        let disk = self.disk.as_ref()?;
        match disk.get(&key).await {
            Ok(Some(hit)) => {
                debug!(url = %url, tier = "disk", "Image cache hit");
                self.memory.put(key, hit.clone()).await;
                Some(hit)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(url = %url, error = %e, "Image cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write `bytes` for `url` through both tiers.
    ///
    /// Persistence failures are logged and otherwise ignored.
    pub async fn store(&self, url: &Url, bytes: Bytes, content_type: Option<String>) {
        let key = self.key_for(url);
        let image = CachedImage::new(bytes, content_type);

        if let Some(disk) = &self.disk {
            if let Err(e) = disk.put(&key, &image).await {
                warn!(url = %url, error = %e, "Failed to persist cached image");
            }
        }

        debug!(url = %url, size = image.bytes.len(), "Stored image in cache");
        self.memory.put(key, image).await;
    }

    /// Remove `url` from both tiers.
    pub async fn remove(&self, url: &Url) {
        let key = self.key_for(url);
        self.memory.remove(&key).await;
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.remove(&key).await {
                warn!(url = %url, error = %e, "Failed to remove cached image");
            }
        }
    }

    /// Drop every entry from both tiers.
    pub async fn clear(&self) {
        self.memory.clear().await;
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.clear().await {
                warn!(error = %e, "Failed to clear persistent image cache");
            }
        }
    }

    /// The memory tier.
    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    /// The persistent tier, if configured.
    pub fn disk(&self) -> Option<&DiskCache> {
        self.disk.as_ref()
    }
}

// =============================================================================
// Tests
// =============================================================================
