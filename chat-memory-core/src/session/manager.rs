//! Session memory store shared across request handlers

use super::store::{ChatMessage, Role, Session};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type SessionHandle = Arc<Mutex<Session>>;

/// Owns every conversation session of the process.
///
/// The map lock is held only long enough to look up, insert or remove a
/// session handle. Work on a single session happens under that session's own
/// mutex, so appends to one id are serialized while different ids proceed
/// independently. Callers only ever receive copies of the stored values.
#[derive(Debug, Default)]
pub struct SessionMemoryStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_id(session_id: &str) -> crate::Result<()> {
        if session_id.trim().is_empty() {
            return Err(crate::Error::InvalidSessionId);
        }
        Ok(())
    }

    fn handle(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(session_id).cloned()
    }

    fn with_session<T>(&self, session_id: &str, f: impl FnOnce(&Session) -> T) -> Option<T> {
        let handle = self.handle(session_id)?;
        let session = handle.lock();
        Some(f(&session))
    }

    fn handle_or_insert(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.handle(session_id) {
            return handle;
        }

        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(session_id))))
            .clone()
    }

    /// Get or create a session, returning a snapshot of it
    pub fn get_or_create(&self, session_id: &str) -> crate::Result<Session> {
        Self::validate_id(session_id)?;
        let handle = self.handle_or_insert(session_id);
        let session = handle.lock().clone();
        Ok(session)
    }

    /// Get a snapshot of a session if it exists
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.with_session(session_id, Session::clone)
    }

    /// Append a message, parsing `role` from its string form.
    ///
    /// Fails with [`crate::Error::InvalidRole`] for anything but `"user"` or
    /// `"bot"`, and with [`crate::Error::OutOfOrderTimestamp`] when
    /// `timestamp` is earlier than the session's latest message. History is
    /// unchanged on error.
    pub fn append(
        &self,
        session_id: &str,
        role: &str,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> crate::Result<()> {
        Self::validate_id(session_id)?;
        let role: Role = role.parse()?;
        self.push(session_id, role, content, timestamp)
    }

    /// Append a message with an already-typed role
    pub fn push(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> crate::Result<()> {
        Self::validate_id(session_id)?;
        let content = content.into();
        if content.trim().is_empty() {
            return Err(crate::Error::EmptyContent);
        }

        let handle = self.handle_or_insert(session_id);
        let mut session = handle.lock();
        session.push(ChatMessage::new(role, content, timestamp))
    }

    /// The most recent `k` exchanges of a session, oldest first.
    ///
    /// Unknown sessions read as empty. Never modifies the stored history.
    pub fn windowed_view(&self, session_id: &str, k: usize) -> Vec<ChatMessage> {
        self.with_session(session_id, |session| session.window(k).to_vec())
            .unwrap_or_default()
    }

    /// Full history of a session for replay or audit
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.with_session(session_id, |session| session.messages().to_vec())
            .unwrap_or_default()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// All currently known session ids
    pub fn list_session_ids(&self) -> HashSet<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Summaries of all sessions, most recently updated first
    pub fn sessions(&self) -> Vec<SessionInfo> {
        let handles: Vec<SessionHandle> = self.sessions.read().values().cloned().collect();

        let mut infos: Vec<SessionInfo> = handles
            .iter()
            .map(|handle| {
                let session = handle.lock();
                SessionInfo {
                    key: session.key().to_string(),
                    message_count: session.messages().len(),
                    exchange_count: session.exchange_count(),
                    created_at: session.created_at(),
                    updated_at: session.updated_at(),
                }
            })
            .collect();

        infos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.key.cmp(&b.key)));
        infos
    }

    /// Remove a session and its whole history.
    ///
    /// Returns whether a session was removed; unknown ids are a no-op.
    pub fn evict(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

/// Information about a session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session key
    pub key: String,
    /// Number of stored messages
    pub message_count: usize,
    /// Number of exchanges in the stored history
    pub exchange_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn contents(messages: &[ChatMessage]) -> Vec<String> {
        messages.iter().map(|m| m.content().to_string()).collect()
    }

    #[test]
    fn test_store_creation() {
        let store = SessionMemoryStore::new();
        assert!(store.is_empty());
        assert!(store.list_session_ids().is_empty());
    }

    #[test]
    fn test_get_or_create_session() {
        let store = SessionMemoryStore::new();
        let session = store.get_or_create("1").unwrap();

        assert_eq!(session.key(), "1");
        assert!(session.is_empty());
        assert!(store.contains("1"));

        store.append("1", "user", "Hello", at(1)).unwrap();
        let again = store.get_or_create("1").unwrap();
        assert_eq!(again.messages().len(), 1);
        assert_eq!(store.len(), 1);

        assert_eq!(store.get("1").unwrap().messages().len(), 1);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_empty_session_id_rejected() {
        let store = SessionMemoryStore::new();
        assert!(matches!(
            store.get_or_create("  "),
            Err(crate::Error::InvalidSessionId)
        ));
        assert!(matches!(
            store.append("", "user", "hi", at(1)),
            Err(crate::Error::InvalidSessionId)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_conversation_window() {
        let store = SessionMemoryStore::new();
        store.append("s1", "user", "hi", at(1)).unwrap();
        store.append("s1", "bot", "hello", at(2)).unwrap();
        store.append("s1", "user", "how are you", at(3)).unwrap();

        let window = store.windowed_view("s1", 1);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].role(), Role::User);
        assert_eq!(window[0].content(), "how are you");
        assert_eq!(window[0].timestamp(), at(3));

        assert_eq!(
            contents(&store.windowed_view("s1", 2)),
            vec!["hi", "hello", "how are you"]
        );
    }

    #[test]
    fn test_invalid_role_leaves_history_empty() {
        let store = SessionMemoryStore::new();
        let err = store.append("s2", "ALIEN", "x", at(1)).unwrap_err();

        assert!(matches!(err, crate::Error::InvalidRole(_)));
        assert!(store.history("s2").is_empty());
        assert!(!store.contains("s2"));
    }

    #[test]
    fn test_out_of_order_append() {
        let store = SessionMemoryStore::new();
        store.append("s3", "user", "a", at(5)).unwrap();
        let err = store.append("s3", "user", "b", at(3)).unwrap_err();

        assert!(matches!(err, crate::Error::OutOfOrderTimestamp { .. }));
        assert_eq!(contents(&store.history("s3")), vec!["a"]);
    }

    #[test]
    fn test_empty_content_rejected() {
        let store = SessionMemoryStore::new();
        assert!(matches!(
            store.append("s", "user", "   ", at(1)),
            Err(crate::Error::EmptyContent)
        ));
        assert!(!store.contains("s"));
    }

    #[test]
    fn test_windowed_view_unknown_session() {
        let store = SessionMemoryStore::new();
        assert!(store.windowed_view("missing", 3).is_empty());
        assert!(!store.contains("missing"));
    }

    #[test]
    fn test_windowed_view_is_pure() {
        let store = SessionMemoryStore::new();
        for i in 0..10 {
            let role = if i % 2 == 0 { "user" } else { "bot" };
            store.append("s", role, format!("m{}", i), at(i)).unwrap();
        }

        let first = store.windowed_view("s", 3);
        let second = store.windowed_view("s", 3);
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
        assert_eq!(store.history("s").len(), 10);
    }

    #[test]
    fn test_evict_is_idempotent() {
        let store = SessionMemoryStore::new();
        store.append("gone", "user", "bye", at(1)).unwrap();

        assert!(store.evict("gone"));
        assert!(!store.evict("gone"));
        assert!(!store.list_session_ids().contains("gone"));
        assert!(store.history("gone").is_empty());
    }

    #[test]
    fn test_sessions_sorted_by_update() {
        let store = SessionMemoryStore::new();
        store.append("a", "user", "first", at(1)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.append("b", "user", "second", at(2)).unwrap();

        let infos = store.sessions();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].key, "b");
        assert_eq!(infos[1].key, "a");
        assert_eq!(infos[0].message_count, 1);
        assert_eq!(infos[0].exchange_count, 1);
    }
}
