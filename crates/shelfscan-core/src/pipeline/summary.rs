//! Human-readable scan summaries and review actions.

use serde::{Deserialize, Serialize};

use crate::extract::normalize::truncate_chars;
use crate::models::label::{ExtractionResult, UNKNOWN_PRODUCT};

/// Prompt sent with the review actions.
pub const ACTION_PROMPT: &str = "Choose an action:";

/// What the user can do with a scan summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    Accept,
    Edit,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Accept => "accept",
            ReviewKind::Edit => "edit",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ReviewKind::Accept => "Accept",
            ReviewKind::Edit => "Edit",
        }
    }
}

/// A follow-up action attached to a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAction {
    pub kind: ReviewKind,
    /// Button text.
    pub label: String,
    /// `<kind>_<source id prefix>`.
    pub callback_data: String,
}

impl ReviewAction {
    /// Build an action keyed by the first `max_id_chars` characters of the
    /// source id.
    pub fn new(kind: ReviewKind, source_id: &str, max_id_chars: usize) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            callback_data: format!("{}_{}", kind.as_str(), truncate_chars(source_id, max_id_chars)),
        }
    }

    /// Split callback data back into its kind and source id prefix.
    pub fn parse_callback(data: &str) -> Option<(ReviewKind, &str)> {
        let (kind, id) = data.split_once('_')?;
        let kind = match kind {
            "accept" => ReviewKind::Accept,
            "edit" => ReviewKind::Edit,
            _ => return None,
        };
        (!id.is_empty()).then_some((kind, id))
    }
}

/// The accept/edit pair sent after every summary.
pub fn review_actions(source_id: &str, max_id_chars: usize) -> [ReviewAction; 2] {
    [
        ReviewAction::new(ReviewKind::Accept, source_id, max_id_chars),
        ReviewAction::new(ReviewKind::Edit, source_id, max_id_chars),
    ]
}

/// Render the summary message for an extraction.
///
/// Confidence is shown as a percentage of `max_confidence`, the weight total
/// of the extractor that produced `result`.
pub fn render_summary(result: &ExtractionResult, max_confidence: u32, ocr_provider: &str) -> String {
    let mut text = String::from("Label analysis complete\n\n");

    text.push_str(&format!(
        "Product: {}\n",
        result.product_name.as_deref().unwrap_or(UNKNOWN_PRODUCT)
    ));
    text.push_str(&format!(
        "Expiry: {}\n",
        result.expiry_date.as_deref().unwrap_or("Not detected")
    ));
    text.push_str(&format!(
        "Confidence: {}%\n",
        confidence_percent(result.confidence, max_confidence)
    ));

    if let Some(quantity) = result.quantity.as_deref().filter(|q| !q.is_empty()) {
        text.push_str(&format!("Quantity: {}\n", quantity));
    }
    if let Some(barcode) = result.barcode.as_deref().filter(|b| !b.is_empty()) {
        text.push_str(&format!("Barcode: {}\n", barcode));
    }

    text.push_str(&format!("\nOCR: {}", ocr_provider));
    text
}

/// `confidence` as a rounded percentage of `max`, capped at 100.
pub fn confidence_percent(confidence: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    let percent = (u64::from(confidence) * 100 + u64::from(max) / 2) / u64::from(max);
    percent.min(100) as u32
}

/// Short summary used when the full one could not be delivered.
pub fn render_fallback_summary(result: &ExtractionResult) -> String {
    format!(
        "Analysis complete!\nProduct: {}\nExpiry: {}",
        result.product_name.as_deref().unwrap_or("Unknown"),
        result.expiry_date.as_deref().unwrap_or("Not found")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_full_summary() {
        let result = ExtractionResult {
            product_name: Some("Greek Yogurt".to_string()),
            expiry_date: Some("12/05/26".to_string()),
            quantity: Some("500".to_string()),
            barcode: Some("3017620422003".to_string()),
            confidence: 100,
            ..ExtractionResult::default()
        };

        assert_eq!(
            render_summary(&result, 100, "AWS Textract"),
            "Label analysis complete\n\n\
             Product: Greek Yogurt\n\
             Expiry: 12/05/26\n\
             Confidence: 100%\n\
             Quantity: 500\n\
             Barcode: 3017620422003\n\
             \nOCR: AWS Textract"
        );
    }

    #[test]
    fn test_render_summary_without_optional_lines() {
        let result = ExtractionResult {
            product_name: Some("Unknown Product".to_string()),
            confidence: 30,
            ..ExtractionResult::default()
        };

        let text = render_summary(&result, 100, "OCR");
        assert!(text.contains("Expiry: Not detected\n"));
        assert!(text.contains("Confidence: 30%\n"));
        assert!(!text.contains("Quantity"));
        assert!(!text.contains("Barcode"));
    }

    #[test]
    fn test_confidence_scaled_to_weight_total() {
        let result = ExtractionResult {
            product_name: Some("Milk".to_string()),
            confidence: 200,
            ..ExtractionResult::default()
        };
        assert!(render_summary(&result, 200, "OCR").contains("Confidence: 100%\n"));

        assert_eq!(confidence_percent(150, 200), 75);
        assert_eq!(confidence_percent(1, 3), 33);
        assert_eq!(confidence_percent(2, 3), 67);
        assert_eq!(confidence_percent(30, 100), 30);
        assert_eq!(confidence_percent(u32::MAX, u32::MAX), 100);
    }

    #[test]
    fn test_fallback_summary() {
        let result = ExtractionResult::default();
        assert_eq!(
            render_fallback_summary(&result),
            "Analysis complete!\nProduct: Unknown\nExpiry: Not found"
        );
    }

    #[test]
    fn test_review_actions_truncate_id() {
        let id = "AgACAgQAAxkBAAIBZ2Zx_very_long_file_identifier";
        let [accept, edit] = review_actions(id, 20);
        assert_eq!(accept.callback_data, "accept_AgACAgQAAxkBAAIBZ2Zx");
        assert_eq!(edit.callback_data, "edit_AgACAgQAAxkBAAIBZ2Zx");
        assert_eq!(accept.label, "Accept");
    }

    #[test]
    fn test_parse_callback() {
        let [accept, _] = review_actions("file_with_underscores", 20);
        assert_eq!(
            ReviewAction::parse_callback(&accept.callback_data),
            Some((ReviewKind::Accept, "file_with_underscore"))
        );
        assert_eq!(ReviewAction::parse_callback("delete_abc"), None);
        assert_eq!(ReviewAction::parse_callback("edit_"), None);
        assert_eq!(ReviewAction::parse_callback("accept"), None);
    }
}
