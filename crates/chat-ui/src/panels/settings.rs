//! Settings panel — API key, assistant ids, logging endpoint, layout.
//! Includes an explicit Apply button with visual feedback.

use egui::{self, RichText, Vec2};
use chat_types::config::{AppConfig, LayoutVariant, DEFAULT_API_BASE};
use crate::theme::*;

/// What the caller should do after rendering the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    /// Nothing changed
    None,
    /// A field was changed
    Changed,
    /// The user clicked the explicit Apply button
    ApplyClicked,
}

/// Apply feedback passed in from the app layer
#[derive(Clone)]
pub struct SaveFeedback {
    pub message: String,
    pub success: bool,
}

/// Render the settings panel. Returns an action for the caller to handle.
pub fn settings_panel(
    ui: &mut egui::Ui,
    config: &mut AppConfig,
    feedback: Option<&SaveFeedback>,
) -> SettingsAction {
    let mut changed = false;
    let mut apply_clicked = false;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
            ui.separator();

            // ── Assistant Section ────────────────────────────
            ui.label(RichText::new("Assistant").color(ACCENT).strong());
            ui.add_space(2.0);

            // API Key (masked)
            ui.label(RichText::new("API Key").color(TEXT_SECONDARY).small());
            let api_key_edit = egui::TextEdit::singleline(&mut config.assistant.api_key)
                .password(true)
                .hint_text("sk-...");
            changed |= ui.add(api_key_edit).changed();

            ui.add_space(4.0);

            // Custom base URL
            ui.label(RichText::new("API Base URL (optional)").color(TEXT_SECONDARY).small());
            let mut base_url = config.assistant.api_base.clone().unwrap_or_default();
            if ui
                .add(egui::TextEdit::singleline(&mut base_url).hint_text(DEFAULT_API_BASE))
                .changed()
            {
                config.assistant.api_base = if base_url.is_empty() {
                    None
                } else {
                    Some(base_url)
                };
                changed = true;
            }

            ui.add_space(4.0);

            ui.label(RichText::new("Chat assistant id").color(TEXT_SECONDARY).small());
            changed |= ui
                .add(
                    egui::TextEdit::singleline(&mut config.assistant.chat_assistant_id)
                        .hint_text("asst_..."),
                )
                .changed();

            ui.add_space(4.0);

            ui.label(RichText::new("Evaluation assistant id").color(TEXT_SECONDARY).small());
            changed |= ui
                .add(
                    egui::TextEdit::singleline(&mut config.assistant.eval_assistant_id)
                        .hint_text("asst_..."),
                )
                .changed();

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Logging Section ──────────────────────────────
            ui.label(RichText::new("Logging").color(ACCENT).strong());
            ui.add_space(2.0);

            changed |= ui
                .checkbox(&mut config.logging.enabled, "Log evaluations")
                .changed();
            ui.label(RichText::new("Endpoint").color(TEXT_SECONDARY).small());
            changed |= ui
                .add_enabled(
                    config.logging.enabled,
                    egui::TextEdit::singleline(&mut config.logging.endpoint),
                )
                .changed();

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Layout Section ───────────────────────────────
            ui.label(RichText::new("Layout").color(ACCENT).strong());
            ui.add_space(2.0);

            egui::ComboBox::from_id_salt("layout_variant")
                .selected_text(config.layout.label())
                .show_ui(ui, |ui| {
                    for variant in LayoutVariant::all() {
                        changed |= ui
                            .selectable_value(&mut config.layout, *variant, variant.label())
                            .changed();
                    }
                });

            ui.add_space(4.0);
            ui.label(
                RichText::new(layout_description(config.layout))
                    .color(TEXT_SECONDARY)
                    .small()
                    .italics(),
            );

            // ── Apply Button ─────────────────────────────────
            ui.add_space(16.0);
            ui.separator();
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                let btn = ui.add(
                    egui::Button::new(
                        RichText::new("Apply Settings")
                            .color(TEXT_PRIMARY)
                            .strong(),
                    )
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(120.0, 28.0)),
                );
                if btn.clicked() {
                    apply_clicked = true;
                }

                if let Some(fb) = feedback {
                    let color = if fb.success { SUCCESS } else { ERROR };
                    ui.label(RichText::new(&fb.message).color(color).small());
                }
            });
        });

    if apply_clicked {
        SettingsAction::ApplyClicked
    } else if changed {
        SettingsAction::Changed
    } else {
        SettingsAction::None
    }
}

pub fn layout_description(layout: LayoutVariant) -> &'static str {
    match layout {
        LayoutVariant::Tabbed => "Chat on the Examine tab; evaluate and log the transcript on the Evaluate tab.",
        LayoutVariant::Single => "One continuous chat view. No evaluation, nothing is logged.",
    }
}
