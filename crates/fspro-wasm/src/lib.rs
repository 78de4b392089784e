use fspro_chat::ClientConfig;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod app;
mod dom;
mod http_gateway;
mod local_storage;
mod spawner;
mod view;

/// Initialize the WASM module
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging; the level is narrowed once the config is known
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("FSPro chat WASM initialized");
}

/// Start the chat page.
///
/// `config_json` is an optional JSON object with `ClientConfig` fields;
/// omitted fields take their defaults.
#[wasm_bindgen]
pub async fn init_chat(config_json: Option<String>) -> Result<(), JsValue> {
    let config = ClientConfig::from_json(config_json.as_deref().unwrap_or(""))
        .map_err(|e| JsValue::from_str(&format!("Invalid chat config: {}", e)))?;

    log::set_max_level(config.log_level().to_level_filter());
    log::info!("Initializing chat (responder: {})", config.chat_url());

    app::ChatApp::new(config)?.start()
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
