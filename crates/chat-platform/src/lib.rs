//! Browser adapters for the chat-core ports.

pub mod llm;
pub mod logging;
