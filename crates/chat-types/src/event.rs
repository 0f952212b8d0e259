use serde::{Deserialize, Serialize};

use crate::message::Message;

/// One event from a streamed assistant run.
///
/// Only `TextDelta` carries reply text; everything else the service sends
/// (run status changes, step updates, message creation) is folded into
/// `Other` and kept by name for logging. `Failed` is terminal: the run
/// errored or its body broke off, and the text so far is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    TextDelta { text: String },
    Other { event: String },
    Failed { message: String },
}

impl StreamEvent {
    pub fn text_delta(text: impl Into<String>) -> Self {
        StreamEvent::TextDelta { text: text.into() }
    }

    pub fn other(event: impl Into<String>) -> Self {
        StreamEvent::Other { event: event.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        StreamEvent::Failed { message: message.into() }
    }
}

/// Events emitted by the chat session.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A chat turn started for this user input
    TurnStart { turn_id: u64, input: String },

    /// Reply text accumulated so far
    ReplySnapshot { text: String },

    /// A message was appended to the conversation
    MessageAppended { message: Message },

    /// The reply stream ended and the reply was appended to the conversation
    ReplyComplete { text: String },

    /// An evaluation run started
    EvaluationStart,

    /// Evaluation text accumulated so far
    EvaluationSnapshot { text: String },

    /// The evaluation stream ended with non-empty text
    EvaluationComplete { text: String },

    /// The logging service accepted the transcript
    Logged,

    /// The rendered conversation changed
    Transcript { text: String },

    /// Something the user should see, but the session is fine
    Warning { message: String },

    /// The current action failed
    Error { message: String },

    /// The current turn or evaluation finished (successfully or not)
    TurnEnd { turn_id: u64 },
}
