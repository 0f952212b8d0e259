//! Evaluate panel — read-only transcript, evaluation trigger, and result.

use egui::{self, RichText, ScrollArea, Vec2};
use crate::state::{NoticeKind, UiState};
use crate::theme::*;

/// Render the evaluate panel. Returns true when the user asks for an evaluation.
pub fn evaluate_panel(ui: &mut egui::Ui, state: &mut UiState) -> bool {
    let mut requested = false;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.heading(
                RichText::new("Evaluate Conversation Log")
                    .color(TEXT_PRIMARY)
                    .strong(),
            );
            ui.separator();

            ui.label(RichText::new("Conversation Log").color(TEXT_SECONDARY).small());
            ScrollArea::vertical()
                .id_salt("transcript_scroll")
                .max_height(300.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    // Read-only view; edits to the local copy are discarded
                    let mut transcript = state.transcript.as_str();
                    ui.add(
                        egui::TextEdit::multiline(&mut transcript)
                            .desired_width(f32::INFINITY)
                            .desired_rows(12)
                            .font(egui::TextStyle::Monospace),
                    );
                });

            ui.add_space(8.0);

            let enabled = state.can_evaluate();
            let button = ui.add_enabled(
                enabled,
                egui::Button::new(
                    RichText::new("EVALUATE RESPONSES")
                        .color(TEXT_PRIMARY)
                        .strong(),
                )
                .fill(if enabled { ACCENT } else { BG_SURFACE })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(180.0, 28.0)),
            );
            if button.clicked() {
                requested = true;
            }

            ui.add_space(8.0);

            if let Some(notice) = &state.evaluation_notice {
                let (color, bg) = match notice.kind {
                    NoticeKind::Success => (SUCCESS, BG_SECONDARY),
                    NoticeKind::Warning => (WARNING, WARNING_BG),
                    NoticeKind::Error => (ERROR, ERROR_BG),
                };
                egui::Frame::default()
                    .fill(bg)
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(&notice.message).color(color));
                    });
                ui.add_space(4.0);
            }

            if !state.evaluation_text.is_empty() {
                ui.label(RichText::new("Evaluation Result:").color(SUCCESS).strong());
                egui::Frame::default()
                    .fill(BG_SECONDARY)
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("evaluation_scroll")
                            .auto_shrink([false, true])
                            .show(ui, |ui| {
                                ui.label(RichText::new(&state.evaluation_text).color(TEXT_PRIMARY));
                            });
                    });
            }
        });

    requested
}
