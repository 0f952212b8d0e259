//! Single chat layout — one continuous conversation in a centered column,
//! with user messages right-aligned in bubbles.

use egui::{self, Align, Layout, RichText, ScrollArea};
use crate::panels::examine::{input_row, render_streaming, role_style};
use crate::state::{ChatEntry, UiState};
use crate::theme::*;

/// Render the single chat view. Returns Some(message) when user submits input.
pub fn single_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<String> {
    let mut submitted = None;

    let column_width = ui.available_width().min(SINGLE_COLUMN_WIDTH);
    let margin = ((ui.available_width() - column_width) / 2.0).max(0.0);

    ui.horizontal_top(|ui| {
        ui.add_space(margin);
        ui.vertical(|ui| {
            ui.set_width(column_width);

            ui.vertical_centered(|ui| {
                ui.heading(RichText::new("Assistant").color(TEXT_PRIMARY).strong());
                ui.label(RichText::new(&state.status_text).color(TEXT_SECONDARY).small());
            });
            ui.add_space(8.0);

            let available_height = ui.available_height() - 56.0;
            ScrollArea::vertical()
                .id_salt("single_scroll")
                .max_height(available_height)
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for entry in &state.messages {
                        render_bubble(ui, entry, column_width);
                        ui.add_space(6.0);
                    }
                    if !state.streaming_text.is_empty() {
                        render_streaming(ui, &state.streaming_text);
                    }
                });

            ui.add_space(8.0);
            submitted = input_row(ui, state, "Message the assistant");
        });
    });

    submitted
}

fn render_bubble(ui: &mut egui::Ui, entry: &ChatEntry, column_width: f32) {
    let (_, label_color, _) = role_style(&entry.role);
    let is_user = entry.role == "user";
    let fill = match entry.role.as_str() {
        "user" => USER_BUBBLE,
        "assistant" => ASSISTANT_BUBBLE,
        "warning" => WARNING_BG,
        _ => ERROR_BG,
    };
    let layout = if is_user {
        Layout::right_to_left(Align::TOP)
    } else {
        Layout::left_to_right(Align::TOP)
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::default()
            .fill(fill)
            .corner_radius(BUBBLE_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_max_width(column_width * 0.8);
                let color = if is_user || entry.role == "assistant" {
                    TEXT_PRIMARY
                } else {
                    label_color
                };
                ui.label(RichText::new(&entry.content).color(color));
            });
    });
}
