//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }

    /// Role name expected by chat-completion style model APIs
    pub fn as_llm_role(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "bot" => Ok(Role::Bot),
            other => Err(crate::Error::InvalidRole(other.to_string())),
        }
    }
}

/// A chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Convert to LLM format (role and content only)
    pub fn to_llm_format(&self) -> serde_json::Value {
        serde_json::json!({
            "role": self.role.as_llm_role(),
            "content": &self.content,
        })
    }
}

/// A conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    key: String,
    messages: Vec<ChatMessage>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new, empty session
    pub(crate) fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Full history in chronological order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, enforcing non-decreasing timestamps.
    ///
    /// On error the history is left untouched.
    pub(crate) fn push(&mut self, message: ChatMessage) -> crate::Result<()> {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                return Err(crate::Error::OutOfOrderTimestamp {
                    session: self.key.clone(),
                    last: last.timestamp,
                    attempted: message.timestamp,
                });
            }
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Start index of the exchange that ends at `end` (exclusive)
    fn exchange_start(&self, end: usize) -> usize {
        match self.messages[end - 1].role {
            // A bot reply pairs with the user message right before it
            Role::Bot if end >= 2 && self.messages[end - 2].role == Role::User => end - 2,
            _ => end - 1,
        }
    }

    /// Index of the first message of the `k` most recent exchanges
    fn window_start(&self, k: usize) -> usize {
        let mut start = self.messages.len();
        let mut collected = 0;

        while start > 0 && collected < k {
            start = self.exchange_start(start);
            collected += 1;
        }

        start
    }

    /// The most recent `k` exchanges, oldest first.
    ///
    /// An exchange is a user message plus the bot reply that follows it. A
    /// trailing unanswered user message, or a bot message with no user
    /// message directly before it, counts as an exchange on its own.
    pub fn window(&self, k: usize) -> &[ChatMessage] {
        &self.messages[self.window_start(k)..]
    }

    /// Number of exchanges in the full history
    pub fn exchange_count(&self) -> usize {
        let mut count = 0;
        let mut end = self.messages.len();
        while end > 0 {
            end = self.exchange_start(end);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn session_with(messages: &[(Role, &str)]) -> Session {
        let mut session = Session::new("test");
        for (i, (role, content)) in messages.iter().enumerate() {
            session
                .push(ChatMessage::new(*role, *content, at(i as i64)))
                .unwrap();
        }
        session
    }

    fn contents(messages: &[ChatMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.content()).collect()
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("bot".parse::<Role>().unwrap(), Role::Bot);
        assert!(matches!(
            "ALIEN".parse::<Role>(),
            Err(crate::Error::InvalidRole(r)) if r == "ALIEN"
        ));
        assert!("User".parse::<Role>().is_err());
        assert!("assistant".parse::<Role>().is_err());
    }

    #[test]
    fn test_llm_format_maps_bot_to_assistant() {
        let msg = ChatMessage::new(Role::Bot, "Hi there!", at(0));
        let value = msg.to_llm_format();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "Hi there!");
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let msg = ChatMessage::new(Role::User, "hello", at(0));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_push_rejects_older_timestamp() {
        let mut session = Session::new("s3");
        session.push(ChatMessage::new(Role::User, "a", at(5))).unwrap();

        let err = session
            .push(ChatMessage::new(Role::User, "b", at(3)))
            .unwrap_err();
        assert!(matches!(err, crate::Error::OutOfOrderTimestamp { .. }));
        assert_eq!(contents(session.messages()), vec!["a"]);
    }

    #[test]
    fn test_push_accepts_equal_timestamp() {
        let mut session = Session::new("test");
        session.push(ChatMessage::new(Role::User, "a", at(5))).unwrap();
        session.push(ChatMessage::new(Role::Bot, "b", at(5))).unwrap();
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_window_trailing_partial_exchange() {
        let session = session_with(&[
            (Role::User, "hi"),
            (Role::Bot, "hello"),
            (Role::User, "how are you"),
        ]);

        assert_eq!(contents(session.window(1)), vec!["how are you"]);
        assert_eq!(
            contents(session.window(2)),
            vec!["hi", "hello", "how are you"]
        );
        assert_eq!(session.exchange_count(), 2);
    }

    #[test]
    fn test_window_zero_is_empty() {
        let session = session_with(&[(Role::User, "hi"), (Role::Bot, "hello")]);
        assert!(session.window(0).is_empty());
    }

    #[test]
    fn test_window_larger_than_history() {
        let session = session_with(&[(Role::User, "hi"), (Role::Bot, "hello")]);
        assert_eq!(contents(session.window(10)), vec!["hi", "hello"]);
    }

    #[test]
    fn test_window_orphan_bot_messages() {
        let session = session_with(&[
            (Role::Bot, "welcome"),
            (Role::User, "q1"),
            (Role::Bot, "a1"),
            (Role::Bot, "a1 continued"),
        ]);

        assert_eq!(contents(session.window(1)), vec!["a1 continued"]);
        assert_eq!(
            contents(session.window(2)),
            vec!["q1", "a1", "a1 continued"]
        );
        assert_eq!(session.exchange_count(), 3);
    }

    #[test]
    fn test_window_consecutive_user_messages() {
        let session = session_with(&[
            (Role::User, "one"),
            (Role::User, "two"),
            (Role::Bot, "reply"),
        ]);

        assert_eq!(contents(session.window(1)), vec!["two", "reply"]);
        assert_eq!(contents(session.window(2)), vec!["one", "two", "reply"]);
    }
}
