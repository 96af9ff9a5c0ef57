//! Fetch-cache-assign coordinator.
//!
//! # Request flow
//!
//! ```text
//! request(target, url)
//!   │
//!   ├─ url already loading ───────────────────────▶ no-op
//!   ├─ cancel target's in-flight fetch
//!   ├─ url already bound ─────────────────────────▶ no-op
//!   ├─ ImageCache::lookup ── hit ──▶ assign + deliver
//!   └─ miss ──▶ FetchHandle::spawn ──▶ (fetch task)
//!                                        │ Completion
//!                                        ▼
//! complete(target, completion)
//!   ├─ id != in-flight id ────────────────────────▶ drop (stale)
//!   ├─ failure ───────────────────────────────────▶ observer only
//!   └─ success ──▶ bind url, spawn store, assign + deliver
//! ```
//!
//! Completions are applied by whoever owns the target, on its own task, so
//! the binding is only ever mutated through `&mut Target`.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::warn;
use url::Url;

use super::fetch::{Completion, FetchHandle};
use super::loaded::LoadedImage;
use super::observer::{ImageSource, LoadEvent, LoadObserver};
use super::sink::ResultSink;
use super::surface::{DisplaySurface, SurfaceContent, SurfaceKind, Transition};
use super::target::{InFlight, Target};
use crate::cache::ImageCache;
use crate::config::{LoaderConfig, DEFAULT_FADE_MS, DEFAULT_FETCH_TIMEOUT_SECS};
use crate::error::LoadError;
use crate::transport::{FetchRequest, Transport};

/// Decides, per target, whether to serve from cache, fetch, or do nothing,
/// and delivers each result at most once to the target that asked for it.
///
/// One coordinator is shared by every target; it holds the cache and the
/// injected transport but no per-target state.
///
/// Completions may be applied from a thread outside the runtime. Cache stores
/// started there run on the runtime the coordinator was built in, or the one
/// given to [`FetchCoordinator::with_runtime`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use netimage::{
///     DisplaySurface, FetchCoordinator, HttpTransport, ImageCache, SurfaceContent,
///     SurfaceKind, Target, Transition,
/// };
///
/// struct Thumbnail;
///
/// impl DisplaySurface for Thumbnail {
///     fn kind(&self) -> SurfaceKind {
///         SurfaceKind::View
///     }
///
///     fn assign(&mut self, content: SurfaceContent, _transition: Transition) {
///         println!("showing {:?}", content.dimensions());
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let cache = Arc::new(ImageCache::in_memory(16 * 1024 * 1024));
///     let transport = Arc::new(HttpTransport::new().unwrap());
///     let coordinator = FetchCoordinator::new(cache, transport);
///
///     let mut target = Target::new(Thumbnail);
///     coordinator.set_image(&mut target, "https://example.com/a.jpg").await;
///     coordinator.settle(&mut target).await;
/// }
/// ```
pub struct FetchCoordinator {
    cache: Arc<ImageCache>,
    transport: Arc<dyn Transport>,
    fetch_timeout: Duration,
    fade: Option<Duration>,
    observer: Option<Arc<dyn LoadObserver>>,
    runtime: Option<Handle>,
}

impl FetchCoordinator {
    /// Create a coordinator with the default timeout and fade.
    pub fn new(cache: Arc<ImageCache>, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache,
            transport,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            fade: Some(Duration::from_millis(DEFAULT_FADE_MS)),
            observer: None,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Create a coordinator using the timeout and fade from `config`.
    pub fn from_config(
        config: &LoaderConfig,
        cache: Arc<ImageCache>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            fade: config.fade(),
            ..Self::new(cache, transport)
        }
    }

    /// Set the timeout applied to each network fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the fade hint for layer surfaces; `None` disables it.
    pub fn with_fade(mut self, fade: Option<Duration>) -> Self {
        self.fade = fade;
        self
    }

    /// Receive every [`LoadEvent`] in addition to the tracing output.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run background cache stores on `handle`.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// The shared image cache.
    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    /// Load the image at `url` into `target`.
    ///
    /// Unparseable input is ignored.
    pub async fn set_image<S: DisplaySurface>(&self, target: &mut Target<S>, url: &str) {
        match Url::parse(url) {
            Ok(url) => self.request(target, url, None).await,
            Err(e) => self.emit(LoadEvent::Rejected {
                error: LoadError::InvalidUrl {
                    input: url.to_string(),
                    message: e.to_string(),
                },
            }),
        }
    }

    /// Load `url` into `target` and hand the image to `on_complete` once shown.
    ///
    /// `on_complete` is never called if the load fails, is superseded, or is
    /// de-duplicated.
    pub async fn set_image_with<S, F>(&self, target: &mut Target<S>, url: Url, on_complete: F)
    where
        S: DisplaySurface,
        F: ResultSink + 'static,
    {
        self.request(target, url, Some(Box::new(on_complete))).await
    }

    /// Show `url` from cache if present, without touching the network.
    ///
    /// The binding is left unchanged and no transition is requested. Returns
    /// whether an image was assigned.
    pub async fn show_cached_image_if_present<S: DisplaySurface>(
        &self,
        target: &mut Target<S>,
        url: &Url,
    ) -> bool {
        let Some(cached) = self.cache.lookup(url).await else {
            return false;
        };

        match LoadedImage::decode(url.clone(), cached) {
            Ok(image) => {
                let surface = target.surface_mut();
                let content = SurfaceContent::for_kind(surface.kind(), &image);
                surface.assign(content, Transition::None);
                true
            }
            Err(error) => {
                self.emit(LoadEvent::Failed {
                    url: url.clone(),
                    request_id: None,
                    error,
                });
                false
            }
        }
    }

    /// Cancel the target's in-flight fetch, if any.
    pub fn cancel<S: DisplaySurface>(&self, target: &mut Target<S>) {
        if let Some(in_flight) = target.binding_mut().take_in_flight() {
            in_flight.handle.cancel();
            self.emit(LoadEvent::Cancelled {
                url: in_flight.handle.url().clone(),
                request_id: in_flight.handle.id(),
            });
        }
    }

    /// Apply a completion posted by one of the target's fetch tasks.
    pub fn complete<S: DisplaySurface>(&self, target: &mut Target<S>, completion: Completion) {
        let current = target
            .binding()
            .in_flight()
            .map(|in_flight| in_flight.handle.id());
        let (id, url, outcome) = completion.into_parts();

        if current != Some(id) {
            self.emit(LoadEvent::StaleCompletion {
                url,
                request_id: id,
            });
            return;
        }

        let Some(in_flight) = target.binding_mut().take_in_flight() else {
            return;
        };

        match outcome {
            Ok(image) => {
                target.binding_mut().bind(url.clone());
                self.spawn_store(&image);
                self.assign_and_deliver(target, image, in_flight.on_result, ImageSource::Network);
            }
            Err(error) => self.emit(LoadEvent::Failed {
                url,
                request_id: Some(id),
                error,
            }),
        }
    }

    /// Apply every queued completion without waiting. Returns how many were
    /// applied, stale ones included.
    pub fn drain<S: DisplaySurface>(&self, target: &mut Target<S>) -> usize {
        let mut applied = 0;
        while let Some(completion) = target.try_next_completion() {
            self.complete(target, completion);
            applied += 1;
        }
        applied
    }

    /// Apply completions until the target has no fetch in flight.
    pub async fn settle<S: DisplaySurface>(&self, target: &mut Target<S>) {
        while target.is_loading() {
            let Some(completion) = target.next_completion().await else {
                break;
            };
            self.complete(target, completion);
        }
    }

    // =========================================================================
    // Decision algorithm
    // =========================================================================

    async fn request<S: DisplaySurface>(
        &self,
        target: &mut Target<S>,
        url: Url,
        on_result: Option<Box<dyn ResultSink>>,
    ) {
        if target.binding().loading_url() == Some(&url) {
            self.emit(LoadEvent::Duplicate { url });
            return;
        }

        // Going back to the shown URL still supersedes whatever else is loading
        self.cancel(target);

        if target.binding().bound_url() == Some(&url) {
            self.emit(LoadEvent::Duplicate { url });
            return;
        }

        if let Some(cached) = self.cache.lookup(&url).await {
            match LoadedImage::decode(url.clone(), cached) {
                Ok(image) => {
                    target.binding_mut().bind(url);
                    self.assign_and_deliver(target, image, on_result, ImageSource::Cache);
                    return;
                }
                Err(error) => {
                    // Unreadable entry: drop it and refetch
                    self.emit(LoadEvent::Failed {
                        url: url.clone(),
                        request_id: None,
                        error,
                    });
                    self.cache.remove(&url).await;
                }
            }
        }

        let request = FetchRequest::new(url.clone(), self.fetch_timeout);
        let request_id = request.id;
        let handle = FetchHandle::spawn(
            Arc::clone(&self.transport),
            request,
            target.completion_sender(),
        );
        target.binding_mut().install(InFlight { handle, on_result });

        self.emit(LoadEvent::FetchStarted { url, request_id });
    }

    fn assign_and_deliver<S: DisplaySurface>(
        &self,
        target: &mut Target<S>,
        image: LoadedImage,
        on_result: Option<Box<dyn ResultSink>>,
        source: ImageSource,
    ) {
        let surface = target.surface_mut();
        let kind = surface.kind();
        let transition = match (kind, self.fade) {
            (SurfaceKind::Layer, Some(duration)) => Transition::Fade(duration),
            _ => Transition::None,
        };
        surface.assign(SurfaceContent::for_kind(kind, &image), transition);

        let url = image.url().clone();
        if let Some(sink) = on_result {
            sink.deliver(image);
        }
        self.emit(LoadEvent::Delivered { url, source });
    }

    /// Write fetched bytes through the cache without blocking delivery.
    fn spawn_store(&self, image: &LoadedImage) {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            warn!(url = %image.url(), "No tokio runtime available, skipping cache store");
            return;
        };

        let cache = Arc::clone(&self.cache);
        let url = image.url().clone();
        let encoded = image.encoded().clone();
        runtime.spawn(async move {
            cache.store(&url, encoded.bytes, encoded.content_type).await;
        });
    }

    fn emit(&self, event: LoadEvent) {
        event.trace();
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
