//! Session-scoped conversation state

use crate::message::{Message, MessageKind, MessageSource};

/// The single mutable record of one conversation
///
/// Messages are append-only until [`ChatState::clear_chat`]. Setting an error
/// always stops loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    messages: Vec<Message>,
    is_loading: bool,
    error: Option<String>,
    current_input: String,
}

impl ChatState {
    /// An empty conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    /// Appends a new message and clears any displayed error
    pub fn add_message(
        &mut self,
        content: &str,
        kind: MessageKind,
        source: Option<MessageSource>,
    ) -> &Message {
        self.error = None;
        self.messages.push(Message::new(content, kind, source));
        &self.messages[self.messages.len() - 1]
    }

    pub const fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Sets or clears the error banner; a new error stops loading
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
        self.is_loading = false;
    }

    pub fn set_current_input(&mut self, input: impl Into<String>) {
        self.current_input = input.into();
    }

    /// Empties messages and error. Loading and the typed input are left alone so an
    /// in-flight request and partially typed text survive.
    pub fn clear_chat(&mut self) {
        self.messages.clear();
        self.error = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
