//! Persistent tier of the image cache.
//!
//! Each entry is two files in the cache directory, both named after the hex
//! SHA-256 of the canonical key:
//!
//! - `<stem>.bin` - the encoded image bytes exactly as fetched
//! - `<stem>.json` - a [`DiskEntryMeta`] sidecar (url, content type, timestamps)
//!
//! Writes go to a temporary file that is renamed into place, payload first,
//! so a reader never observes a sidecar without its payload.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::key::CacheKey;
use super::CachedImage;
use crate::error::CacheError;

/// Metadata stored alongside each cached payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskEntryMeta {
    /// URL the entry was fetched from
    pub url: String,

    /// Content type reported by the server, if any
    pub content_type: Option<String>,

    /// Seconds since the Unix epoch when the entry was written
    pub stored_at: u64,

    /// Freshness window in seconds
    pub max_age: u64,

    /// Payload length in bytes
    pub len: u64,
}

impl DiskEntryMeta {
    /// Whether the entry is still inside its freshness window at `now`.
    pub fn is_fresh_at(&self, now: u64) -> bool {
        now < self.stored_at.saturating_add(self.max_age)
    }
}

/// Directory-backed cache of encoded images.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Use `dir` as the cache directory. It is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.bin", key.file_stem()))
    }

    fn meta_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Read a fresh entry.
    ///
    /// Returns `Ok(None)` when the entry is absent. Stale, truncated or
    /// unparseable entries are deleted and reported as absent.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<CachedImage>, CacheError> {
        let meta_raw = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: DiskEntryMeta = match serde_json::from_slice(&meta_raw) {
            Ok(meta) => meta,
            Err(e) => {
                debug!(error = %e, "Disk cache sidecar unreadable");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if !meta.is_fresh_at(unix_now()) {
            debug!(url = %meta.url, "Disk cache entry expired");
            self.remove(key).await?;
            return Ok(None);
        }

        let payload = match tokio::fs::read(self.payload_path(key)).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if payload.len() as u64 != meta.len {
            debug!(
                url = %meta.url,
                expected = meta.len,
                actual = payload.len(),
                "Disk cache entry truncated"
            );
            self.remove(key).await?;
            return Ok(None);
        }

        Ok(Some(CachedImage::new(Bytes::from(payload), meta.content_type)))
    }

    /// Write an entry, replacing any previous one for the same key.
    pub async fn put(&self, key: &CacheKey, image: &CachedImage) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let meta = DiskEntryMeta {
            url: key.url().to_string(),
            content_type: image.content_type.clone(),
            stored_at: unix_now(),
            max_age: key.max_age().as_secs(),
            len: image.bytes.len() as u64,
        };
        let meta_raw = serde_json::to_vec_pretty(&meta)?;

        write_atomic(&self.payload_path(key), &image.bytes).await?;
        write_atomic(&self.meta_path(key), &meta_raw).await?;
        Ok(())
    }

    /// Delete an entry. Missing files are not an error.
    pub async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        for path in [self.meta_path(key), self.payload_path(key)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Delete every entry in the cache directory.
    pub async fn clear(&self) -> Result<(), CacheError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let ours = matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("bin") | Some("json") | Some("tmp")
            );
            if ours {
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}

/// Distinguishes temporary files of concurrent writers in this process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.tmp", std::process::id(), seq));
    let tmp = path.with_file_name(name);
    tokio::fs::write(&tmp, data).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

// =============================================================================
// Tests
// =============================================================================
