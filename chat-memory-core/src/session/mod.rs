//! Session management for conversation history
//!
//! Every session keeps its complete history in memory. Consumers that feed a
//! model read a windowed view of the most recent exchanges instead, which is
//! computed on read and never trims the stored history.

pub mod manager;
pub mod store;

pub use manager::{SessionInfo, SessionMemoryStore};
pub use store::{ChatMessage, Role, Session};
