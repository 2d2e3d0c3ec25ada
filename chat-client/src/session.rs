//! Conversation controller: ties the state reducer to the chat service

use tracing::info;

use crate::feedback::{describe_service_error, ErrorInfo};
use crate::message::{MessageKind, MessageSource};
use crate::service::{ChatReply, ChatService};
use crate::state::ChatState;
use crate::ChatServiceError;

/// A failed send that can be replayed verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRequest {
    pub message: String,
    pub endpoint: MessageSource,
}

/// Result of a send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or another request is still in flight
    Ignored,
    /// The assistant reply was appended
    Replied,
    /// An error message was appended and the banner set
    Failed(ErrorInfo),
}

/// One interactive conversation
///
/// `&mut self` on every mutating call means at most one request is in flight.
pub struct ChatSession {
    state: ChatState,
    service: ChatService,
    last_failed: Option<FailedRequest>,
}

impl ChatSession {
    #[must_use]
    pub fn new(service: ChatService) -> Self {
        Self {
            state: ChatState::new(),
            service,
            last_failed: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ChatState {
        &self.state
    }

    #[must_use]
    pub const fn service(&self) -> &ChatService {
        &self.service
    }

    /// The request a "Retry" action would replay, if the last failure was retryable
    #[must_use]
    pub const fn retryable_request(&self) -> Option<&FailedRequest> {
        self.last_failed.as_ref()
    }

    /// Updates the typed input. Typing dismisses a displayed error.
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.state.set_current_input(value);
        if self.state.error().is_some() && !self.state.current_input().is_empty() {
            self.state.clear_error();
            self.last_failed = None;
        }
    }

    /// Sends whatever is currently typed
    pub async fn send_current(&mut self, endpoint: MessageSource) -> SendOutcome {
        let message = self.state.current_input().to_string();
        self.send(&message, endpoint).await
    }

    /// Sends `message` to `endpoint` and records the outcome in the history
    ///
    /// The user's message stays in the history even when the send fails.
    pub async fn send(&mut self, message: &str, endpoint: MessageSource) -> SendOutcome {
        if message.trim().is_empty() || self.state.is_loading() {
            return SendOutcome::Ignored;
        }

        self.state.add_message(message, MessageKind::User, None);
        self.state.set_loading(true);
        self.state.set_current_input("");

        let result = self.dispatch(message, endpoint).await;

        let outcome = match result {
            Ok(reply) => {
                self.state
                    .add_message(&reply.content, MessageKind::Assistant, Some(reply.source));
                info!(%endpoint, "New message received");
                SendOutcome::Replied
            }
            Err(err) => {
                let error_info = describe_service_error(&err, endpoint);
                self.state
                    .add_message(&error_info.message, MessageKind::Error, None);
                self.state.set_error(Some(error_info.message.clone()));
                self.last_failed = error_info.is_retryable.then(|| FailedRequest {
                    message: message.to_string(),
                    endpoint,
                });
                SendOutcome::Failed(error_info)
            }
        };

        self.state.set_loading(false);
        outcome
    }

    /// Replays the last retryable failure, if any
    pub async fn retry(&mut self) -> SendOutcome {
        let Some(request) = self.last_failed.take() else {
            return SendOutcome::Ignored;
        };
        self.state.clear_error();
        self.send(&request.message, request.endpoint).await
    }

    /// Clears history, the banner and the retry slot
    pub fn clear(&mut self) {
        self.state.clear_chat();
        self.state.clear_error();
        self.last_failed = None;
    }

    async fn dispatch(
        &self,
        message: &str,
        endpoint: MessageSource,
    ) -> Result<ChatReply, ChatServiceError> {
        match endpoint {
            MessageSource::Local => self.service.send_to_local(message).await,
            MessageSource::Remote => self.service.send_to_remote(message).await,
            MessageSource::Bedrock => self.service.send_to_research(message).await,
        }
    }
}
