pub mod openai_assistants;
pub mod sse;

pub use openai_assistants::OpenAiAssistantsProvider;
