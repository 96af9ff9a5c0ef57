//! Display targets and their per-target load state.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use super::fetch::{Completion, FetchHandle};
use super::sink::ResultSink;
use super::surface::DisplaySurface;

/// The fetch currently allowed to deliver to a target.
pub(crate) struct InFlight {
    pub(crate) handle: FetchHandle,
    pub(crate) on_result: Option<Box<dyn ResultSink>>,
}

/// Which URL a target shows and which fetch, if any, is loading for it.
///
/// Invariant: at most one in-flight fetch. Installing a new one cancels the
/// previous fetch and drops its result sink.
#[derive(Default)]
pub struct TargetBinding {
    bound_url: Option<Url>,
    in_flight: Option<InFlight>,
}

impl TargetBinding {
    /// URL of the image last assigned by a load request.
    pub fn bound_url(&self) -> Option<&Url> {
        self.bound_url.as_ref()
    }

    /// URL currently being fetched.
    pub fn loading_url(&self) -> Option<&Url> {
        self.in_flight.as_ref().map(|f| f.handle.url())
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn bind(&mut self, url: Url) {
        self.bound_url = Some(url);
    }

    pub(crate) fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub(crate) fn install(&mut self, in_flight: InFlight) {
        if let Some(previous) = self.in_flight.replace(in_flight) {
            previous.handle.cancel();
        }
    }

    pub(crate) fn take_in_flight(&mut self) -> Option<InFlight> {
        self.in_flight.take()
    }
}

impl std::fmt::Debug for TargetBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetBinding")
            .field("bound_url", &self.bound_url.as_ref().map(Url::as_str))
            .field("loading_url", &self.loading_url().map(Url::as_str))
            .finish()
    }
}

/// A display surface together with the load state it owns.
///
/// Fetch tasks never touch the target; they post [`Completion`]s to its
/// channel, which the owning task applies through the coordinator.
pub struct Target<S> {
    surface: S,
    binding: TargetBinding,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl<S: DisplaySurface> Target<S> {
    /// Wrap `surface` with an empty binding.
    pub fn new(surface: S) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            surface,
            binding: TargetBinding::default(),
            completions_tx,
            completions_rx,
        }
    }

    /// The wrapped display surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the wrapped display surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Unwrap the surface, cancelling any in-flight fetch.
    pub fn into_surface(self) -> S {
        self.surface
    }

    /// The target's load state.
    pub fn binding(&self) -> &TargetBinding {
        &self.binding
    }

    /// URL of the image last assigned by a load request.
    pub fn bound_url(&self) -> Option<&Url> {
        self.binding.bound_url()
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.binding.is_loading()
    }

    /// Whether completions are queued and waiting to be applied.
    pub fn has_pending_completions(&self) -> bool {
        !self.completions_rx.is_empty()
    }

    /// Forget the bound URL and cancel any in-flight fetch.
    ///
    /// Call this when the surface's content is cleared externally, so the next
    /// request for the same URL loads again instead of being de-duplicated.
    pub fn clear(&mut self) {
        self.binding.bound_url = None;
        if let Some(in_flight) = self.binding.in_flight.take() {
            in_flight.handle.cancel();
        }
    }

    /// Wait for the next completion posted by a fetch task.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Take a queued completion without waiting.
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.try_recv().ok()
    }

    pub(crate) fn binding_mut(&mut self) -> &mut TargetBinding {
        &mut self.binding
    }

    pub(crate) fn completion_sender(&self) -> UnboundedSender<Completion> {
        self.completions_tx.clone()
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Target<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("surface", &self.surface)
            .field("binding", &self.binding)
            .finish()
    }
}
