//! Network transport for image bytes.
//!
//! [`Transport`] is the seam between the coordinator and the network. The
//! coordinator only needs "GET these bytes within this timeout", so tests can
//! swap in an in-memory implementation while applications inject an
//! [`HttpTransport`] built once at startup.

mod http;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::cache::CachePolicy;
use crate::error::TransportError;

pub use http::HttpTransport;

/// Trait for fetching the bytes behind a URL.
///
/// Implementations must be thread-safe; one instance is shared by every
/// in-flight request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET for `request.url`.
    ///
    /// Non-success statuses are errors. The caller enforces `request.timeout`
    /// as an upper bound; implementations may also honor it themselves.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError>;
}

// =============================================================================
// Request / Response
// =============================================================================

/// Process-unique identity of a fetch request.
///
/// Identities increase monotonically and are never reused, so comparing them
/// is enough to tell a current completion from a superseded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single network fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Identity used to detect stale completions
    pub id: RequestId,

    /// URL to fetch
    pub url: Url,

    /// Upper bound on the whole fetch
    pub timeout: Duration,

    /// Cache policy the request is issued with
    pub policy: CachePolicy,
}

impl FetchRequest {
    /// Create a request with a fresh identity.
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            id: RequestId::next(),
            url,
            timeout,
            policy: CachePolicy::UseProtocol,
        }
    }
}

/// Successful response body and metadata.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Response body
    pub bytes: Bytes,

    /// `Content-Type` header value, if present
    pub content_type: Option<String>,

    /// HTTP status code
    pub status: u16,
}
