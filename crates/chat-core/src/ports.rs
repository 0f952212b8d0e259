//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `chat-core` (pure Rust).
//! Implementations live in `chat-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;
use chat_types::{LogError, Result, event::StreamEvent, message::Role};

/// Events of one streamed run, in arrival order. Ends when the run ends.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent>>>;

// ─── Assistant Port ──────────────────────────────────────────

#[async_trait(?Send)]
pub trait AssistantPort {
    /// Create a new server-side thread and return its id
    async fn create_thread(&self) -> Result<String>;

    /// Add a message to an existing thread
    async fn post_message(&self, thread_id: &str, role: Role, content: &str) -> Result<()>;

    /// Start a run of `assistant_id` on the thread and stream its events
    async fn run_streaming(&self, thread_id: &str, assistant_id: &str) -> Result<EventStream>;
}

// ─── Logging Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait LogPort {
    /// Submit a finished transcript together with its evaluation. Single attempt.
    async fn submit(&self, transcript: &str, evaluation: &str) -> std::result::Result<(), LogError>;
}
