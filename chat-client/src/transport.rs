//! HTTP transport used by the chat service

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{header::HeaderName, header::HeaderValue, Client};
use thiserror::Error;
use url::Url;

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Connect timeout; the per-request deadline is applied by the caller
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// A JSON POST request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body
    pub body: String,
}

/// A fully read response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase, empty if unknown
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failures below the HTTP layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport gave up waiting
    #[error("Request timeout")]
    Timeout,

    /// Connection refused, DNS failure, reset, unreadable body...
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built, e.g. an invalid header
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Sends requests on behalf of [`crate::ChatService`]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` as a POST
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Sends a GET to `url`
    async fn get(&self, url: Url) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates the transport
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!("research-chat/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(request.url);
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body).send().await?;

        Self::read(response).await
    }

    async fn get(&self, url: Url) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;

        Self::read(response).await
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
