//! WASM bindings for product label field extraction.
//!
//! Exposes the label extractor to browsers and Node.js. Text recognition
//! runs on the JS side; recognized lines are handed over as plain text.

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use shelfscan_core::models::record::classify_expiry;
use shelfscan_core::pipeline::render_summary;
use shelfscan_core::{extract_label, ExtractionConfig, ExtractionResult, PipelineConfig};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract label fields from OCR text with the default pattern table.
///
/// Always returns a result object; see `diagnostics.error` for degraded runs.
#[wasm_bindgen]
pub fn extract_label_from_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&shelfscan_core::LabelExtractor::new().extract(text))
}

/// Extract label fields using a JSON extraction config
/// (`{"patterns": {...}, "weights": {...}}`).
///
/// A config that does not compile yields a degraded result, not an error.
#[wasm_bindgen]
pub fn extract_label_with_config(text: &str, config_json: &str) -> Result<JsValue, JsValue> {
    let config: ExtractionConfig =
        serde_json::from_str(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&extract_label(text, &config))
}

/// Default extraction config as pretty JSON.
#[wasm_bindgen]
pub fn default_extraction_config() -> Result<String, JsValue> {
    serde_json::to_string_pretty(&ExtractionConfig::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Freshness of an expiry token ("expired", "expiring soon", "fresh" or
/// "unknown") relative to the host's current date.
#[wasm_bindgen]
pub fn expiry_status(expiry: &str) -> String {
    match host_today() {
        Some(today) => classify_expiry(Some(expiry), today).as_str().to_string(),
        None => "unknown".to_string(),
    }
}

fn to_js(result: &ExtractionResult) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Label extractor class for browser use.
#[wasm_bindgen]
pub struct LabelScanner {
    extractor: shelfscan_core::LabelExtractor,
    ocr_provider: String,
}

#[wasm_bindgen]
impl LabelScanner {
    /// Create a scanner with the default pattern table.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            extractor: shelfscan_core::LabelExtractor::new(),
            ocr_provider: PipelineConfig::default().ocr_provider,
        }
    }

    /// Create a scanner from a JSON extraction config.
    ///
    /// Unlike `extract_label_with_config`, an invalid config is reported
    /// here instead of producing degraded results later.
    #[wasm_bindgen]
    pub fn with_config(config_json: &str) -> Result<LabelScanner, JsValue> {
        let config: ExtractionConfig =
            serde_json::from_str(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let extractor = shelfscan_core::LabelExtractor::from_config(&config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            extractor,
            ocr_provider: PipelineConfig::default().ocr_provider,
        })
    }

    /// Set the provider name shown in summaries.
    #[wasm_bindgen]
    pub fn set_ocr_provider(&mut self, provider: &str) {
        self.ocr_provider = provider.to_string();
    }

    /// Extract label fields from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.extractor.extract(text))
    }

    /// Extract and render the chat summary message.
    #[wasm_bindgen]
    pub fn summarize(&self, text: &str) -> String {
        render_summary(
            &self.extractor.extract(text),
            self.extractor.weights().total(),
            &self.ocr_provider,
        )
    }
}

impl Default for LabelScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognized text lines collected from browser-side OCR.
#[wasm_bindgen]
pub struct OcrLines {
    lines: Vec<String>,
}

#[wasm_bindgen]
impl OcrLines {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append one recognized line.
    #[wasm_bindgen]
    pub fn add_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    /// Lines joined with `\n`, the layout the extractor expects.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Extract label fields from the collected lines.
    #[wasm_bindgen]
    pub fn extract_label(&self) -> Result<JsValue, JsValue> {
        extract_label_from_text(&self.get_text())
    }
}

impl Default for OcrLines {
    fn default() -> Self {
        Self::new()
    }
}

/// Current local date of the JS host.
fn host_today() -> Option<NaiveDate> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
}
