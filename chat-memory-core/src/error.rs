//! Error types for chat-memory

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for chat-memory operations
#[derive(Error, Debug)]
pub enum Error {
    /// A message role outside `user` / `bot`
    #[error("Invalid role: {0:?} (expected \"user\" or \"bot\")")]
    InvalidRole(String),

    /// Append with a timestamp older than the session's latest message
    #[error("Out-of-order timestamp in session {session}: {attempted} is earlier than {last}")]
    OutOfOrderTimestamp {
        session: String,
        last: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// Empty or whitespace-only session id
    #[error("Invalid session id: must not be empty")]
    InvalidSessionId,

    /// Empty or whitespace-only message content
    #[error("Message content must not be empty")]
    EmptyContent,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Model invocation errors
    #[error("Provider error: {0}")]
    Provider(String),
}

/// A specialized Result type for chat-memory operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
