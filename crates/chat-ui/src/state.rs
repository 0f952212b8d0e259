//! UI-level state that drives rendering.
//! This is a read-only projection of the chat session,
//! updated each frame by draining the EventBus.

use chat_types::event::ChatEvent;
use chat_core::session::SessionState;

/// State visible to UI panels
pub struct UiState {
    /// Displayed messages (user + assistant + chat errors)
    pub messages: Vec<ChatEntry>,
    /// Current session status
    pub session_status: SessionState,
    /// Streaming reply text being assembled
    pub streaming_text: String,
    /// Rendered conversation, as shown on the Evaluate tab
    pub transcript: String,
    /// Evaluation text, streaming or final
    pub evaluation_text: String,
    /// Outcome of the last evaluation (warning, log result, failure)
    pub evaluation_notice: Option<Notice>,
    /// Input field content
    pub input_text: String,
    /// Selected tab in the tabbed layout
    pub active_tab: Tab,
    /// Whether settings panel is open
    pub show_settings: bool,
    /// Status line text
    pub status_text: String,
    activity: Activity,
}

/// A chat entry for display
#[derive(Clone, Debug, PartialEq)]
pub struct ChatEntry {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Examine,
    Evaluate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Activity {
    Chat,
    Evaluation,
}

pub const LOGGED_MESSAGE: &str = "Conversation and evaluation logged successfully.";

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            session_status: SessionState::Idle,
            streaming_text: String::new(),
            transcript: String::new(),
            evaluation_text: String::new(),
            evaluation_notice: None,
            input_text: String::new(),
            active_tab: Tab::Examine,
            show_settings: false,
            status_text: "Ready".to_string(),
            activity: Activity::Chat,
        }
    }

    /// Mark a chat turn as dispatched, before its first event arrives
    pub fn begin_turn(&mut self) {
        self.activity = Activity::Chat;
        self.session_status = SessionState::Streaming;
        self.status_text = "Thinking...".to_string();
    }

    /// Mark an evaluation as dispatched, before its first event arrives
    pub fn begin_evaluation(&mut self) {
        self.activity = Activity::Evaluation;
        self.session_status = SessionState::Evaluating;
        self.evaluation_text.clear();
        self.evaluation_notice = None;
        self.status_text = "Evaluating...".to_string();
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::TurnStart { .. } => {
                    self.begin_turn();
                    self.streaming_text.clear();
                }
                ChatEvent::MessageAppended { message } => {
                    self.messages.push(ChatEntry {
                        role: message.role.as_str().to_string(),
                        content: message.content,
                    });
                }
                ChatEvent::ReplySnapshot { text } => {
                    self.streaming_text = text;
                }
                ChatEvent::ReplyComplete { .. } => {
                    self.streaming_text.clear();
                }
                ChatEvent::EvaluationStart => {
                    self.begin_evaluation();
                }
                ChatEvent::EvaluationSnapshot { text } | ChatEvent::EvaluationComplete { text } => {
                    self.evaluation_text = text;
                }
                ChatEvent::Logged => {
                    self.evaluation_notice = Some(Notice {
                        kind: NoticeKind::Success,
                        message: LOGGED_MESSAGE.to_string(),
                    });
                }
                ChatEvent::Transcript { text } => {
                    self.transcript = text;
                }
                ChatEvent::Warning { message } => {
                    self.report(NoticeKind::Warning, message);
                }
                ChatEvent::Error { message } => {
                    self.session_status = SessionState::Error(message.clone());
                    self.status_text = format!("Error: {}", message);
                    self.report(NoticeKind::Error, message);
                }
                ChatEvent::TurnEnd { .. } => {
                    self.streaming_text.clear();
                    if self.is_busy() {
                        self.session_status = SessionState::Idle;
                        self.status_text = "Ready".to_string();
                    }
                }
            }
        }
    }

    /// Evaluation problems belong on the Evaluate tab; chat problems go inline.
    fn report(&mut self, kind: NoticeKind, message: String) {
        match self.activity {
            Activity::Evaluation => {
                self.evaluation_notice = Some(Notice { kind, message });
            }
            Activity::Chat => {
                let role = match kind {
                    NoticeKind::Warning => "warning",
                    _ => "error",
                };
                self.messages.push(ChatEntry {
                    role: role.to_string(),
                    content: message,
                });
            }
        }
    }

    /// Take the trimmed input if it can be sent now
    pub fn take_input(&mut self) -> Option<String> {
        let text = self.input_text.trim().to_string();
        if text.is_empty() || self.is_busy() {
            return None;
        }
        self.input_text.clear();
        Some(text)
    }

    pub fn can_evaluate(&self) -> bool {
        !self.is_busy()
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.session_status,
            SessionState::Streaming | SessionState::Evaluating
        )
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
