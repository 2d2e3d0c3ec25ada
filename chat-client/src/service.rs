//! Chat request client: dispatches a query to one of the three backends

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common_types::{AppConfig, ChatRequest, ChatResponse, ResearchRequest, ResearchResponse};
use serde::Deserialize;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::ChatServiceError;
use crate::format::format_plain_text_as_html;
use crate::message::MessageSource;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Long-running research generation gets 30 minutes
pub const RESEARCH_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// What every send path resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Display-ready HTML
    pub content: String,
    /// Backend that produced the reply
    pub source: MessageSource,
    pub timestamp: DateTime<Utc>,
}

/// Partial configuration update. Headers are merged key by key.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    /// New local inference endpoint
    pub local_endpoint: Option<Url>,
    /// `Some(None)` removes the remote endpoint
    pub remote_endpoint: Option<Option<Url>>,
    /// New per-attempt timeout
    pub timeout: Option<Duration>,
    /// New retry budget
    pub max_retries: Option<u32>,
    /// New base backoff delay
    pub retry_delay: Option<Duration>,
    /// Headers added to, or replacing, the configured ones
    pub headers: BTreeMap<String, String>,
}

/// Error envelope of the research proxy
#[derive(Debug, Deserialize)]
struct ProxyError {
    error: Option<String>,
}

/// Sends chat queries with timeout, retry and response normalisation
pub struct ChatService {
    config: AppConfig,
    transport: Arc<dyn Transport>,
}

impl ChatService {
    /// Creates a service from an explicitly loaded configuration
    #[must_use]
    pub const fn new(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Applies a partial configuration update
    pub fn update_config(&mut self, patch: ConfigPatch) {
        if let Some(local_endpoint) = patch.local_endpoint {
            self.config.local_endpoint = local_endpoint;
        }
        if let Some(remote_endpoint) = patch.remote_endpoint {
            self.config.remote_endpoint = remote_endpoint;
        }
        if let Some(timeout) = patch.timeout {
            self.config.timeout = timeout;
        }
        if let Some(max_retries) = patch.max_retries {
            self.config.max_retries = max_retries;
        }
        if let Some(retry_delay) = patch.retry_delay {
            self.config.retry_delay = retry_delay;
        }
        self.config.headers.extend(patch.headers);
    }

    /// Sends `message` to the local inference endpoint
    ///
    /// # Errors
    ///
    /// Returns a `config` error for blank input, otherwise the last error once retries are exhausted
    pub async fn send_to_local(&self, message: &str) -> Result<ChatReply, ChatServiceError> {
        ensure_not_blank(message)?;
        let endpoint = self.config.local_endpoint.clone();
        self.send_with_retry(&endpoint, message, MessageSource::Local)
            .await
    }

    /// Sends `message` to the configured remote endpoint
    ///
    /// # Errors
    ///
    /// Returns a `config` error for blank input or a missing remote endpoint,
    /// otherwise the last error once retries are exhausted
    pub async fn send_to_remote(&self, message: &str) -> Result<ChatReply, ChatServiceError> {
        ensure_not_blank(message)?;
        let Some(endpoint) = self.config.remote_endpoint.clone() else {
            return Err(ChatServiceError::config("Remote endpoint not configured"));
        };
        self.send_with_retry(&endpoint, message, MessageSource::Remote)
            .await
    }

    /// Sends `message` to the agent runtime through the backend's `/api/research` route
    ///
    /// Not retried automatically: a research run can take up to [`RESEARCH_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns a `config` error for blank input, a retryable `timeout` error
    /// after [`RESEARCH_TIMEOUT`], and `api`/`network` errors as classified by the proxy response
    pub async fn send_to_research(&self, message: &str) -> Result<ChatReply, ChatServiceError> {
        ensure_not_blank(message)?;

        let body = serde_json::to_string(&ResearchRequest {
            query: message.to_string(),
        })
        .map_err(|e| ChatServiceError::config(format!("Failed to serialize request: {e}")))?;

        let request = HttpRequest {
            url: self.config.research_url(),
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body,
        };

        let research_timeout = || {
            ChatServiceError::new(
                crate::ErrorKind::Timeout,
                "Request timeout: The research query took longer than 30 minutes to complete",
                Some(408),
                true,
            )
        };

        let response = match tokio::time::timeout(RESEARCH_TIMEOUT, self.transport.post(request))
            .await
        {
            Err(_) | Ok(Err(TransportError::Timeout)) => return Err(research_timeout()),
            Ok(Err(TransportError::Network(_))) => {
                return Err(ChatServiceError::network(
                    "Network error: Unable to connect to research service",
                ))
            }
            Ok(Err(e @ TransportError::InvalidRequest(_))) => {
                return Err(ChatServiceError::api(format!("Research service error: {e}")))
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            let message = serde_json::from_str::<ProxyError>(&response.body)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status_line(&response));
            return Err(ChatServiceError::from_status(response.status, message));
        }

        let data: ResearchResponse = serde_json::from_str(&response.body).map_err(|e| {
            ChatServiceError::api(format!("Invalid response format from research service: {e}"))
        })?;

        let timestamp = DateTime::parse_from_rfc3339(&data.timestamp)
            .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc));

        Ok(ChatReply {
            content: format_plain_text_as_html(&data.content),
            source: MessageSource::Bedrock,
            timestamp,
        })
    }

    async fn send_with_retry(
        &self,
        endpoint: &Url,
        message: &str,
        source: MessageSource,
    ) -> Result<ChatReply, ChatServiceError> {
        let body = serde_json::to_string(&ChatRequest {
            prompt: message.to_string(),
        })
        .map_err(|e| ChatServiceError::config(format!("Failed to serialize request: {e}")))?;

        let mut attempt = 0;
        loop {
            match self.send_once(endpoint, &body).await {
                Ok(content) => {
                    return Ok(ChatReply {
                        content: format_plain_text_as_html(&content),
                        source,
                        timestamp: Utc::now(),
                    })
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.config.retry_delay, attempt);
                    warn!(
                        %source,
                        attempt,
                        ?delay,
                        error = %err,
                        "Retrying chat request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!(%source, attempts = attempt + 1, error = %err, "Chat request failed");
                    return Err(err);
                }
            }
        }
    }

    /// One attempt: POST, classify, extract the `response` field
    async fn send_once(&self, endpoint: &Url, body: &str) -> Result<String, ChatServiceError> {
        let mut headers = self.config.headers.clone();
        if !headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"))
        {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        let request = HttpRequest {
            url: endpoint.clone(),
            headers,
            body: body.to_string(),
        };

        debug!(%endpoint, "Sending chat request");
        let response = match tokio::time::timeout(self.config.timeout, self.transport.post(request))
            .await
        {
            Err(_) | Ok(Err(TransportError::Timeout)) => {
                return Err(ChatServiceError::timeout("Request timeout"))
            }
            Ok(Err(TransportError::Network(msg))) => {
                debug!(%endpoint, error = %msg, "Transport failure");
                return Err(ChatServiceError::network("Network error: Unable to connect"));
            }
            Ok(Err(e @ TransportError::InvalidRequest(_))) => {
                return Err(ChatServiceError::config(e.to_string()))
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(ChatServiceError::from_status(
                response.status,
                status_line(&response),
            ));
        }

        extract_response(&response.body)
    }
}

/// Pulls the reply text out of a 2xx body
///
/// JSON bodies must carry `response`; an `error` field is an application-level failure.
/// Bodies that are not JSON at all are treated as the reply text.
fn extract_response(body: &str) -> Result<String, ChatServiceError> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value @ serde_json::Value::Object(_)) => {
            let parsed: ChatResponse = serde_json::from_value(value).map_err(|_| {
                ChatServiceError::api("Invalid response format: missing response field")
            })?;
            if let Some(error) = parsed.error {
                return Err(ChatServiceError::api(error));
            }
            parsed.response.ok_or_else(|| {
                ChatServiceError::api("Invalid response format: missing response field")
            })
        }
        Ok(serde_json::Value::String(text)) => Ok(text),
        Ok(_) => Err(ChatServiceError::api(
            "Invalid response format: missing response field",
        )),
        Err(_) if !body.trim().is_empty() => Ok(body.to_string()),
        Err(_) => Err(ChatServiceError::api(
            "Invalid response format: unable to parse response",
        )),
    }
}

fn ensure_not_blank(message: &str) -> Result<(), ChatServiceError> {
    if message.trim().is_empty() {
        return Err(ChatServiceError::config("Message cannot be empty"));
    }
    Ok(())
}

fn status_line(response: &HttpResponse) -> String {
    format!("HTTP {}: {}", response.status, response.reason)
}

/// Delay before retry `retry` (1-indexed): `base * 2^(retry - 1)`
#[must_use]
pub const fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(retry.saturating_sub(1)))
}
