//! WASM bindings for the report hub verification overlay
//!
//! Highlights every number on a generated report page with its verification
//! status, keeps reviewers' manual checks in `localStorage`, and fills
//! `data-source` elements from the JSON data files.
//!
//! ## Architecture
//!
//! - Matching, status, summary and the manual-check store live in `verify-core`
//! - `DomRenderer` and `LocalStorage` adapt the engine to the browser
//! - JavaScript only loads the module and calls the entry points
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { start_overlay, bind_data } from './pkg/report_hub_wasm.js';
//!
//! await init();
//! await bind_data(null);
//! await start_overlay(JSON.stringify({ log_level: "debug" }));
//! ```

pub mod binding;
pub mod console;
pub mod dom;
pub mod fetch;
pub mod overlay;
pub mod storage;

use serde::Serialize;
use verify_core::{OverlayConfig, Summary};
use wasm_bindgen::prelude::*;

pub use dom::DomRenderer;
pub use storage::LocalStorage;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Parse the optional config and install console logging at its level
fn configure(config_json: Option<String>) -> OverlayConfig {
    let config = match OverlayConfig::from_optional_json(config_json.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            console::init_logging("info");
            tracing::warn!("Invalid overlay config, using defaults: {}", e);
            return OverlayConfig::default();
        }
    };
    console::init_logging(&config.log_level);
    config
}

/// Mount the verification overlay on the current page
///
/// Resolves to `true` when the overlay is showing. Failures never reject;
/// they are logged and leave the page untouched.
#[wasm_bindgen]
pub async fn start_overlay(config_json: Option<String>) -> bool {
    let config = configure(config_json);
    match overlay::start(&config).await {
        Ok(started) => started,
        Err(e) => {
            tracing::error!("Verification overlay failed to start: {}", e);
            false
        }
    }
}

/// Remove the overlay and restore the page's original text
#[wasm_bindgen]
pub fn stop_overlay() -> bool {
    overlay::stop()
}

/// Fill `data-source` elements; resolves to the number filled
#[wasm_bindgen]
pub async fn bind_data(config_json: Option<String>) -> u32 {
    let config = configure(config_json);
    match binding::bind_document(&config).await {
        Ok(filled) => filled as u32,
        Err(e) => {
            tracing::error!("Data binding failed: {}", e);
            0
        }
    }
}

#[derive(Debug, Serialize)]
struct OverlayStatus {
    running: bool,
    summary: Option<Summary>,
}

/// Current overlay state as `{ running, summary }`
#[wasm_bindgen]
pub fn overlay_status() -> Result<JsValue, JsValue> {
    let status = OverlayStatus {
        running: overlay::is_running(),
        summary: overlay::summary(),
    };
    serde_wasm_bindgen::to_value(&status)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}


#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_status_before_start() {
        let status = overlay_status().unwrap();
        let running = js_sys::Reflect::get(&status, &JsValue::from_str("running")).unwrap();
        assert_eq!(running.as_bool(), Some(false));
    }
}
