//! Chat client for the financial research assistant

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod config;
pub mod error;
pub mod feedback;
pub mod format;
pub mod message;
pub mod service;
pub mod session;
pub mod state;
pub mod transport;

pub use error::{ChatServiceError, ErrorKind};
pub use message::{Message, MessageKind, MessageSource};
pub use service::{ChatReply, ChatService};
pub use session::{ChatSession, SendOutcome};
pub use state::ChatState;
