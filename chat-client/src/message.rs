//! Chat messages and their validation rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    /// Typed by the user
    User,
    /// Reply from one of the backends
    Assistant,
    /// Failure notice shown in place of a reply
    Error,
}

/// Backend a query is routed to, and the backend an assistant message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageSource {
    Local,
    Remote,
    Bedrock,
}

/// A single chat bubble. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MessageSource>,
}

impl Message {
    /// Creates a message with a fresh id and the current time. Content is trimmed.
    #[must_use]
    pub fn new(content: &str, kind: MessageKind, source: Option<MessageSource>) -> Self {
        Self {
            id: generate_message_id(),
            content: content.trim().to_string(),
            kind,
            timestamp: Utc::now(),
            source,
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(content, MessageKind::User, None)
    }

    #[must_use]
    pub fn assistant(content: &str, source: MessageSource) -> Self {
        Self::new(content, MessageKind::Assistant, Some(source))
    }

    #[must_use]
    pub fn error(content: &str) -> Self {
        Self::new(content, MessageKind::Error, None)
    }

    /// Whether the message has an id and non-blank content
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && validate_message_content(&self.content)
    }
}

/// Non-blank input can be sent
#[must_use]
pub fn validate_message_content(content: &str) -> bool {
    !content.trim().is_empty()
}

fn generate_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}
