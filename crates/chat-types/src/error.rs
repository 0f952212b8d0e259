use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Assistant service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("No evaluation response received")]
    EmptyReply,

    #[error("Nothing to evaluate yet")]
    NothingToEvaluate,

    #[error("Failed to log: {0}")]
    Log(#[from] LogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failure submitting a transcript to the logging service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The service answered but reported a failure
    #[error("{0}")]
    Rejected(String),

    /// Non-2xx status, network failure, or an unreadable response
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}
