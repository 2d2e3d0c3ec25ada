//! User-facing descriptions of failed sends

use crate::error::{ChatServiceError, ErrorKind};
use crate::message::MessageSource;

/// What the user sees after a failed send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Full sentence for the chat history and the banner
    pub message: String,
    /// Short label for announcements
    pub user_friendly_message: String,
    /// Whether a "Retry" action is offered
    pub is_retryable: bool,
}

/// Maps any error to a fixed set of user-facing strings
///
/// Only the taxonomy of [`ChatServiceError`] is inspected; bare string errors
/// degrade to a generic "unknown error" and anything else to "unexpected error".
#[must_use]
pub fn describe_error(error: &anyhow::Error, endpoint: MessageSource) -> ErrorInfo {
    if let Some(err) = error.downcast_ref::<ChatServiceError>() {
        return describe_service_error(err, endpoint);
    }

    if error.downcast_ref::<String>().is_some() || error.downcast_ref::<&str>().is_some() {
        return unknown();
    }

    ErrorInfo {
        message: format!("Unexpected error: {error}"),
        user_friendly_message: "Unexpected error occurred".to_string(),
        is_retryable: false,
    }
}

/// Describes a classified service error
#[must_use]
pub fn describe_service_error(err: &ChatServiceError, endpoint: MessageSource) -> ErrorInfo {
    let retryable = err.is_retryable();
    let info = |message: String, user_friendly_message: String| ErrorInfo {
        message,
        user_friendly_message,
        is_retryable: retryable,
    };

    match err.kind() {
        ErrorKind::Network => info(
            format!(
                "Unable to connect to {endpoint} endpoint. Please check your connection and try again."
            ),
            format!("Connection failed to {endpoint} service"),
        ),
        ErrorKind::Timeout => info(
            format!(
                "Request to {endpoint} endpoint timed out. The service may be busy, please try again."
            ),
            format!("{endpoint} service is taking too long to respond"),
        ),
        ErrorKind::Api => match err.status_code() {
            Some(status) if status >= 500 => info(
                format!(
                    "{endpoint} service is temporarily unavailable (Error {status}). Please try again later."
                ),
                format!("{endpoint} service error"),
            ),
            Some(429) => info(
                format!(
                    "Too many requests to {endpoint} endpoint. Please wait a moment and try again."
                ),
                "Rate limit exceeded".to_string(),
            ),
            Some(status) if status >= 400 => info(
                format!(
                    "Invalid request to {endpoint} endpoint (Error {status}). Please check your message and try again."
                ),
                "Invalid request".to_string(),
            ),
            _ => info(
                format!("{endpoint} service error: {}", err.message()),
                format!("{endpoint} service error"),
            ),
        },
        ErrorKind::Config => ErrorInfo {
            message: format!("Configuration error: {}", err.message()),
            user_friendly_message: "Configuration error".to_string(),
            is_retryable: false,
        },
    }
}

fn unknown() -> ErrorInfo {
    ErrorInfo {
        message: "An unknown error occurred. Please try again.".to_string(),
        user_friendly_message: "Unknown error".to_string(),
        is_retryable: false,
    }
}
