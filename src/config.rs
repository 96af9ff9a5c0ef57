//! Configuration for the image loader.
//!
//! [`LoaderConfig`] derives [`clap::Args`] so a host application can flatten it
//! into its own command line. Every option can also be set through an
//! environment variable with the `NETIMAGE_` prefix:
//!
//! - `NETIMAGE_CACHE_DIR` - Directory of the persistent cache (default: none, memory only)
//! - `NETIMAGE_MEMORY_CACHE_BYTES` - Memory tier capacity in bytes (default: 32MB)
//! - `NETIMAGE_MEMORY_CACHE_ENTRIES` - Memory tier entry bound (default: 1000)
//! - `NETIMAGE_CACHE_MAX_AGE` - Freshness window of cached entries in seconds (default: 7 days)
//! - `NETIMAGE_FETCH_TIMEOUT` - Network fetch timeout in seconds (default: 20)
//! - `NETIMAGE_FADE_MS` - Fade-in duration hint for layer surfaces (default: 200)
//! - `NETIMAGE_USER_AGENT` - User agent sent with image requests
//!
//! # Example
//!
//! ```
//! use netimage::config::LoaderConfig;
//!
//! let config = LoaderConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.fetch_timeout().as_secs(), 20);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

// =============================================================================
// Default Values
// =============================================================================

/// Default memory tier capacity: 32MB of encoded image bytes.
pub const DEFAULT_MEMORY_CACHE_BYTES: usize = 32 * 1024 * 1024;

/// Default maximum number of entries held by the memory tier.
pub const DEFAULT_MEMORY_CACHE_ENTRIES: usize = 1000;

/// Default freshness window for cached images (7 days).
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Default network fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

/// Default fade-in duration hint in milliseconds.
pub const DEFAULT_FADE_MS: u64 = 200;

/// Default user agent for image requests.
pub const DEFAULT_USER_AGENT: &str = concat!("netimage/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Loader Configuration
// =============================================================================

/// Settings for the cache, transport and coordinator.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Directory for the persistent image cache.
    ///
    /// When unset, only the in-memory tier is used.
    #[arg(long, env = "NETIMAGE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum total size of the in-memory tier in bytes.
    #[arg(long, default_value_t = DEFAULT_MEMORY_CACHE_BYTES, env = "NETIMAGE_MEMORY_CACHE_BYTES")]
    pub memory_cache_bytes: usize,

    /// Maximum number of entries in the in-memory tier.
    #[arg(long, default_value_t = DEFAULT_MEMORY_CACHE_ENTRIES, env = "NETIMAGE_MEMORY_CACHE_ENTRIES")]
    pub memory_cache_entries: usize,

    /// Freshness window of cached entries in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE_SECS, env = "NETIMAGE_CACHE_MAX_AGE")]
    pub cache_max_age_secs: u64,

    /// Timeout for a single network fetch in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "NETIMAGE_FETCH_TIMEOUT")]
    pub fetch_timeout_secs: u64,

    /// Fade-in duration hint passed to layer surfaces, in milliseconds.
    ///
    /// Zero disables the transition.
    #[arg(long, default_value_t = DEFAULT_FADE_MS, env = "NETIMAGE_FADE_MS")]
    pub fade_ms: u64,

    /// User agent sent with image requests.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "NETIMAGE_USER_AGENT")]
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            memory_cache_bytes: DEFAULT_MEMORY_CACHE_BYTES,
            memory_cache_entries: DEFAULT_MEMORY_CACHE_ENTRIES,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            fade_ms: DEFAULT_FADE_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.memory_cache_entries == 0 {
            return Err("memory_cache_entries must be greater than 0".to_string());
        }

        if self.cache_max_age_secs == 0 {
            return Err("cache_max_age_secs must be greater than 0".to_string());
        }

        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs > 300 {
            return Err("fetch_timeout_secs must be between 1 and 300".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }

        if let Some(dir) = &self.cache_dir {
            if dir.as_os_str().is_empty() {
                return Err("cache_dir must not be an empty path".to_string());
            }
        }

        Ok(())
    }

    /// Freshness window of cached entries.
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// Timeout applied to each network fetch.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Fade-in duration hint, or `None` when disabled.
    pub fn fade(&self) -> Option<Duration> {
        (self.fade_ms > 0).then(|| Duration::from_millis(self.fade_ms))
    }
}

// =============================================================================
// Tests
// =============================================================================
