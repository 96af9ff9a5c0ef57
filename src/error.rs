use thiserror::Error;

/// Errors produced while fetching image bytes over the network.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request did not complete within its timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The server answered with a non-success status
    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// URL scheme the transport cannot fetch
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Errors from the persistent cache tier.
///
/// These never escape [`ImageCache`](crate::cache::ImageCache): lookups treat
/// them as misses and stores log and drop them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem error reading or writing an entry
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata sidecar could not be encoded or decoded
    #[error("Cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Reasons a load request ended without delivering an image.
///
/// The public request API never returns these; they are reported through
/// tracing and the [`LoadObserver`](crate::loader::LoadObserver) hook.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Input string is not a parseable URL
    #[error("Invalid URL {input:?}: {message}")]
    InvalidUrl { input: String, message: String },

    /// Fetch failed, timed out, or returned a non-success status
    #[error("Network failure: {0}")]
    Network(#[from] TransportError),

    /// Bytes were fetched but are not a decodable image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },
}
