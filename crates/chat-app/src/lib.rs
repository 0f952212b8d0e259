//! Assistant examiner — WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters and hands them to the egui UI.

mod app;

use chat_types::config::AppConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CANVAS_ID: &str = "examiner_canvas";
/// Optional `<script type="application/json">` element carrying an `AppConfig`
const CONFIG_ELEMENT_ID: &str = "examiner_config";

/// WASM entry point — called from index.html
#[wasm_bindgen(start)]
pub async fn main() {
    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Assistant examiner starting...");

    let web_options = eframe::WebOptions::default();

    let document = web_sys::window()
        .expect("No window")
        .document()
        .expect("No document");
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .expect("No canvas element with id 'examiner_canvas'")
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .expect("Element is not a canvas");

    let config = load_config(&document);

    wasm_bindgen_futures::spawn_local(async move {
        eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(app::ExaminerApp::new(cc, config)))),
            )
            .await
            .expect("Failed to start eframe");
    });
}

/// Read the page-embedded config, falling back to defaults.
fn load_config(document: &web_sys::Document) -> AppConfig {
    let Some(text) = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
    else {
        log::info!("No embedded config, starting with defaults");
        return AppConfig::default();
    };

    match AppConfig::from_json(&text) {
        Ok(config) => {
            log::info!("Loaded embedded config (layout: {})", config.layout.label());
            config
        }
        Err(e) => {
            log::warn!("Ignoring embedded config: {}", e);
            AppConfig::default()
        }
    }
}
