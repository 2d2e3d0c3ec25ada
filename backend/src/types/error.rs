//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::research::ResearchError;
use crate::types::auth::AuthConfigError;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Whether the client should retry the request
    pub allow_retry: bool,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, retry: bool) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                error: message.into(),
                allow_retry: retry,
            },
        }
    }

    /// `400 Bad Request`, not retryable
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, false)
    }

    /// `500 Internal Server Error`
    #[must_use]
    pub fn internal(message: impl Into<String>, retry: bool) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, retry)
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent to the client
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.status, self.inner.error),
            500..=599 => tracing::error!("Server error: {} - {}", self.status, self.inner.error),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert research failures to application errors
impl From<ResearchError> for AppError {
    fn from(err: ResearchError) -> Self {
        match err {
            ResearchError::Timeout => Self::new(
                StatusCode::REQUEST_TIMEOUT,
                "Request timeout: The research query took too long to complete",
                true,
            ),
            ResearchError::NotConfigured => Self::internal(err.to_string(), false),
            ResearchError::Agent(_) | ResearchError::EmptyResponse => {
                Self::internal(err.to_string(), true)
            }
        }
    }
}

/// Convert missing authentication settings to application errors
impl From<AuthConfigError> for AppError {
    fn from(err: AuthConfigError) -> Self {
        tracing::error!("Authentication configuration error: {err}");
        Self::internal("Failed to load authentication configuration", false)
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
