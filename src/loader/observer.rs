//! Internal observability for load requests.
//!
//! Failures never reach the caller of a request, so every branch the
//! coordinator takes is reported here instead. Events are always logged with
//! `tracing`; a [`LoadObserver`] can additionally receive them, for metrics or
//! tests.

use tracing::{debug, trace};
use url::Url;

use crate::error::LoadError;
use crate::transport::RequestId;

/// Where a delivered image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Cache,
    Network,
}

/// A step or outcome of a load request.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// The input was not a usable URL; nothing happened
    Rejected { error: LoadError },

    /// The URL was already bound or already loading for the target
    Duplicate { url: Url },

    /// A network fetch was issued
    FetchStarted { url: Url, request_id: RequestId },

    /// An in-flight fetch was superseded or cancelled
    Cancelled { url: Url, request_id: RequestId },

    /// A completion arrived for a request that is no longer current
    StaleCompletion { url: Url, request_id: RequestId },

    /// An image was assigned and handed to the result sink
    Delivered { url: Url, source: ImageSource },

    /// The load ended without an image
    Failed {
        url: Url,
        request_id: Option<RequestId>,
        error: LoadError,
    },
}

impl LoadEvent {
    /// Emit the event as a tracing record.
    pub(crate) fn trace(&self) {
        match self {
            LoadEvent::Rejected { error } => {
                debug!(error = %error, "Ignoring image request");
            }
            LoadEvent::Duplicate { url } => {
                trace!(url = %url, "Image already bound or loading");
            }
            LoadEvent::FetchStarted { url, request_id } => {
                debug!(url = %url, request_id = %request_id, "Image fetch started");
            }
            LoadEvent::Cancelled { url, request_id } => {
                debug!(url = %url, request_id = %request_id, "Image fetch cancelled");
            }
            LoadEvent::StaleCompletion { url, request_id } => {
                debug!(url = %url, request_id = %request_id, "Dropping stale image completion");
            }
            LoadEvent::Delivered { url, source } => {
                debug!(url = %url, source = ?source, "Image delivered");
            }
            LoadEvent::Failed {
                url,
                request_id,
                error,
            } => {
                debug!(
                    url = %url,
                    request_id = ?request_id.map(|id| id.as_u64()),
                    error = %error,
                    "Image load failed"
                );
            }
        }
    }
}

/// Hook receiving every [`LoadEvent`].
pub trait LoadObserver: Send + Sync {
    fn on_event(&self, event: &LoadEvent);
}

impl<F> LoadObserver for F
where
    F: Fn(&LoadEvent) + Send + Sync,
{
    fn on_event(&self, event: &LoadEvent) {
        self(event)
    }
}
