use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use super::{FetchRequest, FetchResponse, Transport};
use crate::config::{LoaderConfig, DEFAULT_USER_AGENT};
use crate::error::TransportError;

/// HTTP(S) implementation of [`Transport`] backed by a shared reqwest client.
///
/// Construct one per process and share it; the client pools connections.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the default user agent.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Create a transport sending `user_agent` with every request.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    /// Build the transport described by `config`.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, TransportError> {
        Self::with_user_agent(&config.user_agent)
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let scheme = request.url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(TransportError::UnsupportedScheme(scheme.to_string()));
        }

        debug!(url = %request.url, request_id = %request.id, "Fetching image");

        let response = self
            .client
            .get(request.url.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, request))?;

        Ok(FetchResponse {
            bytes,
            content_type,
            status: status.as_u16(),
        })
    }
}

fn map_reqwest_error(e: reqwest::Error, request: &FetchRequest) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(request.timeout)
    } else {
        TransportError::Connection(e.to_string())
    }
}
