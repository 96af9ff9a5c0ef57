//! # netimage
//!
//! Fetch remote images by URL, cache them, and assign them to display targets.
//!
//! A [`FetchCoordinator`] decides for each (target, URL) pair whether to serve
//! from cache, start a fetch, cancel a superseded fetch, or do nothing, and
//! delivers every result at most once to the target that is still waiting
//! for it.
//!
//! ## Features
//!
//! - **Two-tier cache**: in-memory LRU in front of a persistent directory,
//!   both addressed by one canonical request key
//! - **De-duplication**: re-requesting the bound or loading URL is a no-op
//! - **Stale-result protection**: completions are matched against the
//!   target's current request identity before anything is assigned
//! - **Best-effort delivery**: failures are never surfaced to callers, only
//!   to tracing and an optional observer hook
//!
//! ## Architecture
//!
//! - [`cache`] - canonical keys, memory and disk tiers, [`ImageCache`]
//! - [`transport`] - the [`Transport`] seam and the reqwest-backed [`HttpTransport`]
//! - [`loader`] - targets, surfaces, result sinks and the coordinator
//! - [`config`] - [`LoaderConfig`], flattenable into a host CLI
//! - [`error`] - internal error taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use netimage::{FetchCoordinator, HttpTransport, ImageCache, LoaderConfig};
//!
//! # fn build() -> Result<FetchCoordinator, Box<dyn std::error::Error>> {
//! let config = LoaderConfig::default();
//! config.validate()?;
//!
//! let cache = Arc::new(ImageCache::from_config(&config));
//! let transport = Arc::new(HttpTransport::from_config(&config)?);
//! let coordinator = FetchCoordinator::from_config(&config, cache, transport);
//! # Ok(coordinator)
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod transport;

// Re-export commonly used types
pub use cache::{CacheKey, CachePolicy, CachedImage, DiskCache, ImageCache, MemoryCache};
pub use config::LoaderConfig;
pub use error::{CacheError, LoadError, TransportError};
pub use loader::{
    Completion, DisplaySurface, FetchCoordinator, FetchHandle, ImageSource, LoadEvent,
    LoadObserver, LoadedImage, ResultSink, SurfaceContent, SurfaceKind, Target, TargetBinding,
    Transition,
};
pub use transport::{FetchRequest, FetchResponse, HttpTransport, RequestId, Transport};
