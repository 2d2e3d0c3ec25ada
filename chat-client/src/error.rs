//! Error taxonomy of the chat request client

use thiserror::Error;

/// Failure class, which also decides the default retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Transport failure, retryable
    Network,
    /// Deadline exceeded, retryable
    Timeout,
    /// Non-2xx status or a malformed/erroring payload
    Api,
    /// Caller misuse; never attempted and never retried
    Config,
}

/// Error returned by every [`crate::ChatService`] operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ChatServiceError {
    kind: ErrorKind,
    message: String,
    status_code: Option<u16>,
    retryable: bool,
}

impl ChatServiceError {
    /// Creates an error with an explicit retry decision
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        status_code: Option<u16>,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code,
            retryable,
        }
    }

    /// Caller misuse such as blank input or an unconfigured endpoint
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message, None, false)
    }

    /// Connection-level failure
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message, None, true)
    }

    /// The request outlived its deadline
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message, None, true)
    }

    /// Application-level failure without an HTTP status, e.g. a malformed payload
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message, None, false)
    }

    /// Non-2xx response. Server errors and rate limiting are retryable, other statuses are not.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Api,
            message,
            Some(status),
            is_retryable_status(status),
        )
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// 5xx and 429 may succeed when attempted again
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}
