//! Conversation state: the thread id and the append-only message log.

use chat_types::{Result, message::{Message, Role}};
use crate::ports::AssistantPort;

/// State of one interactive session.
///
/// The thread id is created on first use and then kept for the whole
/// session; there is no operation that resets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    thread_id: Option<String>,
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session's thread id, creating it upstream on first call.
    /// A failed creation leaves the state untouched.
    pub async fn ensure_thread(&mut self, assistant: &dyn AssistantPort) -> Result<String> {
        if let Some(id) = &self.thread_id {
            return Ok(id.clone());
        }
        let id = assistant.create_thread().await?;
        log::info!("Created thread {}", id);
        self.thread_id = Some(id.clone());
        Ok(id)
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// One `"<Role>: <content>"` line per message, in order.
    pub fn render_as_text(&self) -> String {
        self.messages
            .iter()
            .map(Message::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
