//! Cancellable background fetches.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use url::Url;

use super::loaded::LoadedImage;
use crate::cache::CachedImage;
use crate::error::{LoadError, TransportError};
use crate::transport::{FetchRequest, RequestId, Transport};

/// Result of a background fetch, posted back to the owning target.
#[derive(Debug)]
pub struct Completion {
    id: RequestId,
    url: Url,
    outcome: Result<LoadedImage, LoadError>,
}

impl Completion {
    pub(crate) fn new(id: RequestId, url: Url, outcome: Result<LoadedImage, LoadError>) -> Self {
        Self { id, url, outcome }
    }

    /// Identity of the request this completes.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// URL that was fetched.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the fetch produced a decoded image.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub(crate) fn into_parts(self) -> (RequestId, Url, Result<LoadedImage, LoadError>) {
        (self.id, self.url, self.outcome)
    }
}

/// Handle to a fetch running on the tokio runtime.
///
/// The task fetches within the request timeout, decodes the bytes and sends
/// exactly one [`Completion`] unless it is cancelled first. Dropping the
/// handle cancels the fetch.
#[derive(Debug)]
pub struct FetchHandle {
    id: RequestId,
    url: Url,
    task: JoinHandle<()>,
}

impl FetchHandle {
    /// Start `request` on `transport`, reporting through `completions`.
    pub(crate) fn spawn(
        transport: Arc<dyn Transport>,
        request: FetchRequest,
        completions: UnboundedSender<Completion>,
    ) -> Self {
        let id = request.id;
        let url = request.url.clone();

        let task = tokio::spawn(async move {
            let outcome = run_fetch(transport.as_ref(), &request).await;
            // The target may be gone; nobody is left to deliver to
            let _ = completions.send(Completion::new(request.id, request.url, outcome));
        });

        Self { id, url, task }
    }

    /// Identity of the running request.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// URL being fetched.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Stop the fetch. Idempotent; a completion that was already sent is
    /// left in the channel and discarded by the identity check.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the background task has ended, by completion or cancellation.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_fetch(
    transport: &dyn Transport,
    request: &FetchRequest,
) -> Result<LoadedImage, LoadError> {
    let response = tokio::time::timeout(request.timeout, transport.fetch(request))
        .await
        .map_err(|_| TransportError::Timeout(request.timeout))??;

    let encoded = CachedImage::new(response.bytes, response.content_type);
    LoadedImage::decode(request.url.clone(), encoded)
}
