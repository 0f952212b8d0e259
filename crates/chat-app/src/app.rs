//! Main egui application — composes the panels and drives the chat session.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};

use chat_core::event_bus::EventBus;
use chat_core::ports::{AssistantPort, LogPort};
use chat_core::session::ChatSession;
use chat_platform::llm::OpenAiAssistantsProvider;
use chat_platform::logging::HttpLogSink;
use chat_types::config::{AppConfig, LayoutVariant};
use chat_types::event::ChatEvent;
use chat_ui::panels::settings::{SaveFeedback, SettingsAction};
use chat_ui::panels::{evaluate, examine, settings, single};
use chat_ui::state::{Tab, UiState};
use chat_ui::theme;

/// The main application state
pub struct ExaminerApp {
    ui_state: UiState,
    /// Config in effect for dispatched work
    config: AppConfig,
    /// Config being edited in the settings panel
    draft: AppConfig,
    event_bus: EventBus,
    session: Rc<RefCell<ChatSession>>,
    assistant: Rc<dyn AssistantPort>,
    logger: Option<Rc<dyn LogPort>>,
    settings_feedback: Option<SaveFeedback>,
    first_frame: bool,
}

impl ExaminerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let event_bus = EventBus::new();
        let session = ChatSession::new(config.assistant.clone(), event_bus.clone());

        let mut ui_state = UiState::new();
        if let Err(e) = config.validate() {
            log::warn!("{}; opening settings", e);
            ui_state.show_settings = true;
        }

        Self {
            ui_state,
            assistant: build_assistant(&config),
            logger: build_logger(&config),
            draft: config.clone(),
            config,
            event_bus,
            session: Rc::new(RefCell::new(session)),
            settings_feedback: None,
            first_frame: true,
        }
    }

    /// Validate the draft and, if the session is idle, make it current.
    /// The thread id survives a settings change.
    fn apply_settings(&mut self) {
        if let Err(e) = self.draft.validate() {
            self.settings_feedback = Some(SaveFeedback {
                message: e.to_string(),
                success: false,
            });
            return;
        }

        let Ok(mut session) = self.session.try_borrow_mut() else {
            self.settings_feedback = Some(SaveFeedback {
                message: "Busy, apply again when the reply is done".to_string(),
                success: false,
            });
            return;
        };
        session.config = self.draft.assistant.clone();
        drop(session);

        self.config = self.draft.clone();
        self.assistant = build_assistant(&self.config);
        self.logger = build_logger(&self.config);
        self.settings_feedback = Some(SaveFeedback {
            message: "Applied".to_string(),
            success: true,
        });
        log::info!("Settings applied (layout: {})", self.config.layout.label());
    }

    /// Refuse to dispatch with an incomplete config
    fn ready(&mut self) -> bool {
        match self.config.validate() {
            Ok(()) => true,
            Err(e) => {
                self.ui_state.process_events(vec![ChatEvent::Error {
                    message: e.to_string(),
                }]);
                self.ui_state.show_settings = true;
                false
            }
        }
    }
}

fn build_assistant(config: &AppConfig) -> Rc<dyn AssistantPort> {
    Rc::new(OpenAiAssistantsProvider::new(config.assistant.clone()))
}

fn build_logger(config: &AppConfig) -> Option<Rc<dyn LogPort>> {
    if config.logging_active() {
        Some(Rc::new(HttpLogSink::new(config.logging.endpoint.clone())))
    } else {
        None
    }
}

impl eframe::App for ExaminerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        // Drain events from the chat session
        if self.event_bus.has_pending() {
            self.ui_state.process_events(self.event_bus.drain());
            ctx.request_repaint();
        }

        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Assistant Examiner")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                if self.config.layout == LayoutVariant::Tabbed {
                    ui.selectable_value(&mut self.ui_state.active_tab, Tab::Examine, "Examine");
                    ui.selectable_value(&mut self.ui_state.active_tab, Tab::Evaluate, "Evaluate");
                } else {
                    ui.label(
                        RichText::new(self.config.layout.label())
                            .color(theme::TEXT_SECONDARY)
                            .small(),
                    );
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .selectable_label(self.ui_state.show_settings, "Settings")
                        .clicked()
                    {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                    }
                });
            });
        });

        // ── Settings side panel ──────────────────────────────
        if self.ui_state.show_settings {
            SidePanel::right("settings_panel")
                .min_width(280.0)
                .max_width(350.0)
                .show(ctx, |ui| {
                    match settings::settings_panel(ui, &mut self.draft, self.settings_feedback.as_ref()) {
                        SettingsAction::ApplyClicked => self.apply_settings(),
                        SettingsAction::Changed => self.settings_feedback = None,
                        SettingsAction::None => {}
                    }
                });
        }

        // ── Main content ─────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| match self.config.layout {
            LayoutVariant::Tabbed => match self.ui_state.active_tab {
                Tab::Examine => {
                    if let Some(user_msg) = examine::examine_panel(ui, &mut self.ui_state) {
                        self.dispatch_message(user_msg, ctx);
                    }
                }
                Tab::Evaluate => {
                    if evaluate::evaluate_panel(ui, &mut self.ui_state) {
                        self.dispatch_evaluation(ctx);
                    }
                }
            },
            LayoutVariant::Single => {
                if let Some(user_msg) = single::single_panel(ui, &mut self.ui_state) {
                    self.dispatch_message(user_msg, ctx);
                }
            }
        });
    }
}

impl ExaminerApp {
    /// Dispatch a user message to the chat session (async)
    fn dispatch_message(&mut self, text: String, ctx: &egui::Context) {
        if !self.ready() {
            return;
        }
        self.ui_state.begin_turn();

        let session = self.session.clone();
        let assistant = self.assistant.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let result = {
                let mut session = session.borrow_mut();
                session.run_turn(&text, assistant.as_ref()).await
            };
            if let Err(e) = result {
                log::error!("Chat turn error: {}", e);
            }
            ctx.request_repaint();
        });
    }

    /// Run the evaluation assistant over the transcript and log it (async)
    fn dispatch_evaluation(&mut self, ctx: &egui::Context) {
        if !self.ready() {
            return;
        }
        self.ui_state.begin_evaluation();

        let session = self.session.clone();
        let assistant = self.assistant.clone();
        let logger = self.logger.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let result = {
                let mut session = session.borrow_mut();
                session
                    .run_evaluation(assistant.as_ref(), logger.as_deref())
                    .await
            };
            match result {
                Ok(outcome) => log::info!(
                    "Evaluation finished ({} chars, logged: {})",
                    outcome.evaluation.len(),
                    matches!(outcome.logged, Some(Ok(())))
                ),
                Err(e) => log::warn!("Evaluation ended: {}", e),
            }
            ctx.request_repaint();
        });
    }
}
