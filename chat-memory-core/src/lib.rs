//! Core types for chat-memory
//!
//! This crate provides the session memory store that keeps every
//! conversation's full history while handing a bounded window of recent
//! exchanges to the model, plus the conversation driver, the word-level
//! correction diff and the chunking summarizer built on top of it.

pub mod config;
pub mod conversation;
pub mod error;
pub mod grammar;
pub mod logging;
pub mod session;
pub mod summarize;
pub mod utils;

pub use conversation::{ChatModel, Clock, Conversation, SystemClock};
pub use error::{Error, Result};
pub use session::{ChatMessage, Role, Session, SessionInfo, SessionMemoryStore};
