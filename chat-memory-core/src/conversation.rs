//! Conversation driver connecting the session store to a chat model

use crate::session::{ChatMessage, Role, SessionMemoryStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A model that answers from a window of conversation context.
///
/// The last message of `context` is the user prompt being answered.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, context: Vec<ChatMessage>) -> crate::Result<String>;
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn complete(&self, context: Vec<ChatMessage>) -> crate::Result<String> {
        (**self).complete(context).await
    }
}

/// Timestamp source for appended messages
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Drives user/bot turns for any number of sessions over a shared store
pub struct Conversation<M: ChatModel> {
    store: Arc<SessionMemoryStore>,
    model: M,
    window: usize,
    clock: Box<dyn Clock>,
}

impl<M: ChatModel> Conversation<M> {
    /// Create a conversation keeping `window` exchanges of context
    pub fn new(store: Arc<SessionMemoryStore>, model: M, window: usize) -> Self {
        Self {
            store,
            model,
            window,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<SessionMemoryStore> {
        &self.store
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Send a user prompt and record the model's reply.
    ///
    /// If the model fails or answers with nothing, the prompt stays in the
    /// history as an unanswered exchange and the error is returned.
    #[instrument(skip(self, prompt), fields(window = self.window))]
    pub async fn send(&self, session_id: &str, prompt: &str) -> crate::Result<String> {
        self.store
            .push(session_id, Role::User, prompt, self.clock.now())?;

        let context = self.store.windowed_view(session_id, self.window);
        debug!(context_messages = context.len(), "Invoking model");

        let reply = match self.model.complete(context).await {
            Ok(reply) if reply.trim().is_empty() => {
                let e = crate::Error::Provider("model returned an empty reply".to_string());
                warn!(error = %e, "Model invocation failed");
                return Err(e);
            }
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Model invocation failed");
                return Err(e);
            }
        };

        self.store
            .push(session_id, Role::Bot, reply.as_str(), self.clock.now())?;
        info!(reply_len = reply.len(), "Recorded bot reply");

        Ok(reply)
    }
}
