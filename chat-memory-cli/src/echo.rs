//! Offline model used by the CLI

use async_trait::async_trait;
use chat_memory_core::{ChatMessage, ChatModel, Result, Role};

/// Answers every prompt by echoing it back along with how much context it received
#[derive(Debug, Clone, Default)]
pub struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, context: Vec<ChatMessage>) -> Result<String> {
        let prompt = context
            .iter()
            .rev()
            .find(|m| m.role() == Role::User)
            .map(|m| m.content())
            .unwrap_or("");
        let earlier = context.len().saturating_sub(1);

        Ok(format!(
            "You said: \"{}\" ({} earlier message{} in context)",
            prompt,
            earlier,
            if earlier == 1 { "" } else { "s" }
        ))
    }
}
