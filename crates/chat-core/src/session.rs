//! Chat session — runs chat turns and evaluation runs for one user session.
//!
//! A chat turn:
//! 1. Make sure a server-side thread exists
//! 2. Append the user message and post it to the thread
//! 3. Run the chat assistant with streaming, publishing every snapshot
//! 4. Append the finished reply
//!
//! An evaluation runs the evaluation assistant over the same thread,
//! then hands the transcript and the evaluation to the logging service.

use futures::StreamExt;
use chat_types::{
    ChatError, LogError, Result,
    config::AssistantConfig,
    event::ChatEvent,
    message::{Message, Role},
    session::SessionInfo,
};
use crate::accumulator::accumulate;
use crate::conversation::ConversationState;
use crate::event_bus::EventBus;
use crate::ports::{AssistantPort, LogPort};

/// The chat session state
pub struct ChatSession {
    pub config: AssistantConfig,
    pub conversation: ConversationState,
    pub event_bus: EventBus,
    pub state: SessionState,
    pub info: SessionInfo,
    turn_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Evaluating,
    Error(String),
}

/// Result of a finished evaluation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOutcome {
    pub transcript: String,
    pub evaluation: String,
    /// `None` when no logger was supplied
    pub logged: Option<std::result::Result<(), LogError>>,
}

impl ChatSession {
    pub fn new(config: AssistantConfig, event_bus: EventBus) -> Self {
        let info = SessionInfo::new();
        log::info!("Session {} started at {}", info.id, info.started_at);

        Self {
            config,
            conversation: ConversationState::new(),
            event_bus,
            state: SessionState::Idle,
            info,
            turn_counter: 0,
        }
    }

    /// Run one chat turn: user message → streamed reply.
    ///
    /// This is async and must be spawned via `wasm_bindgen_futures::spawn_local`.
    /// Failures are published on the event bus and returned; whatever was
    /// appended before the failure stays in the conversation. A reply is only
    /// appended once its run has ended cleanly.
    pub async fn run_turn(&mut self, user_input: &str, assistant: &dyn AssistantPort) -> Result<()> {
        let turn_id = self.next_turn();
        self.event_bus.emit(ChatEvent::TurnStart {
            turn_id,
            input: user_input.to_string(),
        });
        self.state = SessionState::Streaming;

        let result = self.chat_turn(user_input, assistant).await;
        self.finish(turn_id, result)
    }

    async fn chat_turn(&mut self, user_input: &str, assistant: &dyn AssistantPort) -> Result<()> {
        let thread_id = self.conversation.ensure_thread(assistant).await?;

        self.append(Role::User, user_input);
        assistant.post_message(&thread_id, Role::User, user_input).await?;

        let events = assistant
            .run_streaming(&thread_id, &self.config.chat_assistant_id)
            .await?;

        let mut snapshots = accumulate(events);
        while let Some(text) = snapshots.next().await {
            self.event_bus.emit(ChatEvent::ReplySnapshot { text });
        }
        let deltas = snapshots.delta_count();
        // A failed run leaves the user message without a reply
        let reply = snapshots.finish()?;
        if deltas == 0 {
            log::warn!("Run on thread {} produced no text", thread_id);
        }

        self.append(Role::Assistant, reply.clone());
        self.event_bus.emit(ChatEvent::ReplyComplete { text: reply });
        Ok(())
    }

    /// Run the evaluation assistant over the current thread and, when a
    /// logger is given, submit the transcript and the evaluation to it.
    ///
    /// A logging failure does not fail the evaluation; it is reported in
    /// `EvaluationOutcome::logged` and on the event bus.
    pub async fn run_evaluation(
        &mut self,
        assistant: &dyn AssistantPort,
        logger: Option<&dyn LogPort>,
    ) -> Result<EvaluationOutcome> {
        let turn_id = self.next_turn();
        self.event_bus.emit(ChatEvent::EvaluationStart);
        self.state = SessionState::Evaluating;

        let result = self.evaluate(assistant, logger).await;
        self.finish(turn_id, result)
    }

    async fn evaluate(
        &mut self,
        assistant: &dyn AssistantPort,
        logger: Option<&dyn LogPort>,
    ) -> Result<EvaluationOutcome> {
        let thread_id = match self.conversation.thread_id() {
            Some(id) if !self.conversation.is_empty() => id.to_string(),
            _ => return Err(ChatError::NothingToEvaluate),
        };
        let transcript = self.conversation.render_as_text();

        let events = assistant
            .run_streaming(&thread_id, &self.config.eval_assistant_id)
            .await?;

        let mut snapshots = accumulate(events);
        while let Some(text) = snapshots.next().await {
            self.event_bus.emit(ChatEvent::EvaluationSnapshot { text });
        }

        let evaluation = snapshots.finish()?;
        if evaluation.trim().is_empty() {
            return Err(ChatError::EmptyReply);
        }

        let logged = match logger {
            Some(logger) => {
                let result = logger.submit(&transcript, &evaluation).await;
                match &result {
                    Ok(()) => {
                        log::info!("Transcript for thread {} logged", thread_id);
                        self.event_bus.emit(ChatEvent::Logged);
                    }
                    Err(e) => {
                        log::error!("Logging failed: {}", e);
                        self.event_bus.emit(ChatEvent::Error {
                            message: ChatError::Log(e.clone()).to_string(),
                        });
                    }
                }
                Some(result)
            }
            None => None,
        };

        self.event_bus.emit(ChatEvent::EvaluationComplete {
            text: evaluation.clone(),
        });

        Ok(EvaluationOutcome {
            transcript,
            evaluation,
            logged,
        })
    }

    /// Current transcript, as shown on the Evaluate tab
    pub fn transcript(&self) -> String {
        self.conversation.render_as_text()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, SessionState::Streaming | SessionState::Evaluating)
    }

    fn next_turn(&mut self) -> u64 {
        self.turn_counter += 1;
        self.turn_counter
    }

    fn append(&mut self, role: Role, content: impl Into<String>) {
        let message = Message::new(role, content);
        self.conversation.append(message.role, message.content.clone());
        self.event_bus.emit(ChatEvent::MessageAppended { message });
        self.event_bus.emit(ChatEvent::Transcript {
            text: self.conversation.render_as_text(),
        });
    }

    fn finish<T>(&mut self, turn_id: u64, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.state = SessionState::Idle,
            Err(e @ (ChatError::EmptyReply | ChatError::NothingToEvaluate)) => {
                log::warn!("{}", e);
                self.state = SessionState::Idle;
                self.event_bus.emit(ChatEvent::Warning {
                    message: e.to_string(),
                });
            }
            Err(e) => {
                log::error!("Session {} turn {} failed: {}", self.info.id, turn_id, e);
                self.state = SessionState::Error(e.to_string());
                self.event_bus.emit(ChatEvent::Error {
                    message: e.to_string(),
                });
            }
        }
        self.event_bus.emit(ChatEvent::TurnEnd { turn_id });
        result
    }
}
