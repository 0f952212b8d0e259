//! Examine panel — chat with the assistant.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use crate::state::{ChatEntry, UiState};
use crate::theme::*;

/// Render the examine panel. Returns Some(message) when user submits input.
pub fn examine_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<String> {
    let mut submitted = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(
                        RichText::new("Chat with Assistant")
                            .color(TEXT_PRIMARY)
                            .strong(),
                    );
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status_color = if state.is_busy() { WARNING } else { SUCCESS };
                        ui.label(
                            RichText::new(&state.status_text)
                                .color(status_color)
                                .small(),
                        );
                    });
                });

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for entry in &state.messages {
                            render_message(ui, entry);
                            ui.add_space(4.0);
                        }

                        if !state.streaming_text.is_empty() {
                            render_streaming(ui, &state.streaming_text);
                        }
                    });

                ui.add_space(8.0);

                submitted = input_row(ui, state, "Ask me a question");
            });
        });

    submitted
}

/// Single-line input with a Send button. Returns the text on submit.
pub(crate) fn input_row(ui: &mut egui::Ui, state: &mut UiState, hint: &str) -> Option<String> {
    let mut submitted = None;

    ui.horizontal(|ui| {
        let input = egui::TextEdit::singleline(&mut state.input_text)
            .hint_text(hint)
            .desired_width(ui.available_width() - 70.0)
            .font(egui::FontId::proportional(14.0));

        let response = ui.add(input);

        let send_enabled = !state.input_text.trim().is_empty() && !state.is_busy();
        let send_btn = ui.add_enabled(
            send_enabled,
            egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(60.0, 0.0)),
        );

        // Submit on Enter or button click
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if enter || send_btn.clicked() {
            submitted = state.take_input();
            response.request_focus();
        }
    });

    submitted
}

pub(crate) fn role_style(role: &str) -> (&'static str, egui::Color32, egui::Color32) {
    match role {
        "user" => ("User", ACCENT, BG_SECONDARY),
        "assistant" => ("Assistant", SUCCESS, BG_SECONDARY),
        "warning" => ("Warning", WARNING, WARNING_BG),
        "error" => ("Error", ERROR, ERROR_BG),
        _ => ("???", TEXT_SECONDARY, BG_SECONDARY),
    }
}

fn render_message(ui: &mut egui::Ui, entry: &ChatEntry) {
    let (label, label_color, bg) = role_style(&entry.role);

    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(label).color(label_color).strong().small());
            ui.label(RichText::new(&entry.content).color(TEXT_PRIMARY));
        });
}

pub(crate) fn render_streaming(ui: &mut egui::Ui, text: &str) {
    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(text).color(TEXT_PRIMARY));
            ui.label(RichText::new("▌").color(ACCENT).strong());
        });
}
