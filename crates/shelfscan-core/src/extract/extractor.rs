//! Pattern-table driven label extractor.

use tracing::{debug, info, warn};

use crate::error::{ConfigError, ExtractionError};
use crate::models::config::ExtractionConfig;
use crate::models::label::{Category, ExtractionResult, MatchAttempt, MAX_DIAGNOSTIC_MATCHES};

use super::normalize::{fallback_product_name, normalize};
use super::patterns::{DEFAULT_TABLE, DEFAULT_WEIGHTS};
use super::table::{ConfidenceWeights, PatternTable};

/// Extracts product name, expiry date, quantity and barcode from OCR text.
///
/// Holds only read-only tables, so one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct LabelExtractor {
    table: PatternTable,
    weights: ConfidenceWeights,
}

impl LabelExtractor {
    /// Create an extractor with the default English/French pattern table.
    pub fn new() -> Self {
        Self {
            table: DEFAULT_TABLE.clone(),
            weights: DEFAULT_WEIGHTS.clone(),
        }
    }

    /// Create an extractor from already compiled tables.
    pub fn with_tables(table: PatternTable, weights: ConfidenceWeights) -> Result<Self, ConfigError> {
        weights.check_covers(&table)?;
        Ok(Self { table, weights })
    }

    /// Compile an extractor from configuration data.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        let table = PatternTable::compile(&config.patterns)?;
        let weights = ConfidenceWeights::new(config.weights.clone())?;
        Self::with_tables(table, weights)
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    pub fn weights(&self) -> &ConfidenceWeights {
        &self.weights
    }

    /// Extract label fields. Never fails: internal errors produce a
    /// degraded result instead.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        self.try_extract(text).unwrap_or_else(|e| {
            warn!("Label extraction failed: {}", e);
            ExtractionResult::degraded(e)
        })
    }

    /// Extract label fields, surfacing internal errors.
    pub fn try_extract(&self, text: &str) -> Result<ExtractionResult, ExtractionError> {
        info!("Extracting label fields from {} characters of text", text.len());

        let mut result = ExtractionResult::default();

        for category in Category::ALL {
            self.resolve(category, text, &mut result)?;
        }

        if !result.is_resolved(Category::ProductName) {
            let (name, fallback) = fallback_product_name(text);
            debug!("Product name from fallback {:?}: {}", fallback, name);
            result.product_name = Some(name);
            result.diagnostics.product_name_fallback = Some(fallback);
        }

        result.confidence = self.weights.score(&result);

        debug!(
            "Extracted label '{}' with confidence {}/{}",
            result.product_name.as_deref().unwrap_or_default(),
            result.confidence,
            self.weights.total()
        );

        Ok(result)
    }

    /// Try a category's patterns in order; the first one with any match wins.
    fn resolve(
        &self,
        category: Category,
        text: &str,
        result: &mut ExtractionResult,
    ) -> Result<(), ExtractionError> {
        for (index, pattern) in self.table.patterns(category).iter().enumerate() {
            let matches = pattern.find_matches(text, MAX_DIAGNOSTIC_MATCHES);
            let Some(first) = matches.first() else {
                continue;
            };

            let value = normalize(category, index, pattern.group_count(), first)?;
            debug!(
                "{}: pattern #{} matched {} time(s), value {:?}",
                category,
                index,
                matches.len(),
                value
            );

            result.set_value(category, value);
            result.diagnostics.matches.insert(
                category,
                MatchAttempt {
                    category,
                    pattern: pattern.source().to_string(),
                    pattern_index: index,
                    matches,
                },
            );
            return Ok(());
        }

        debug!("{}: no pattern matched", category);
        Ok(())
    }
}

impl Default for LabelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile `config` and extract from `text` in one call.
///
/// A configuration that does not compile yields the degraded result.
pub fn extract_label(text: &str, config: &ExtractionConfig) -> ExtractionResult {
    match LabelExtractor::from_config(config) {
        Ok(extractor) => extractor.extract(text),
        Err(e) => {
            let e = ExtractionError::from(e);
            warn!("Label extraction failed: {}", e);
            ExtractionResult::degraded(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::extract::patterns::default_patterns;
    use crate::models::label::{NameFallback, DEGRADED_CONFIDENCE, PROCESSING_ERROR, UNKNOWN_PRODUCT};
    use pretty_assertions::assert_eq;

    /// Default table without product name patterns, to exercise the fallback.
    fn extractor_without_name_patterns() -> LabelExtractor {
        let mut config = ExtractionConfig::default();
        config.patterns.insert(Category::ProductName, Vec::new());
        LabelExtractor::from_config(&config).unwrap()
    }

    #[test]
    fn test_full_label() {
        let text = "ORGANIC OAT DRINK\nBest before 12/05/26\n1 l\nEAN 3017620422003";
        let result = LabelExtractor::new().extract(text);

        assert_eq!(result.product_name.as_deref(), Some("ORGANIC OAT DRINK"));
        assert_eq!(result.expiry_date.as_deref(), Some("12/05/26"));
        assert_eq!(result.quantity.as_deref(), Some("1"));
        assert_eq!(result.barcode.as_deref(), Some("3017620422003"));
        assert_eq!(result.confidence, 100);
        assert_eq!(result.diagnostics.matches.len(), 4);
        assert!(result.diagnostics.product_name_fallback.is_none());
    }

    #[test]
    fn test_empty_input() {
        let result = LabelExtractor::new().extract("");

        assert_eq!(result.product_name.as_deref(), Some(UNKNOWN_PRODUCT));
        assert!(result.expiry_date.is_none());
        assert!(result.quantity.is_none());
        assert!(result.barcode.is_none());
        assert_eq!(result.confidence, 30);
        assert!(result.diagnostics.matches.is_empty());
        assert_eq!(result.diagnostics.product_name_fallback, Some(NameFallback::Unknown));
    }

    #[test]
    fn test_labeled_expiry_wins_over_earlier_bare_date() {
        let extractor = LabelExtractor::new();

        for text in [
            "Best before 12/05/26\nRef 01-01-20",
            "Ref 01-01-20\nBest before 12/05/26",
        ] {
            let result = extractor.extract(text);
            assert_eq!(result.expiry_date.as_deref(), Some("12/05/26"), "{text}");
            assert_eq!(result.diagnostics.matches[&Category::ExpiryDate].pattern_index, 0);
        }
    }

    #[test]
    fn test_bare_date_used_when_no_label() {
        let result = LabelExtractor::new().extract("lot A\n03.04.2027\n10.10.2027");
        assert_eq!(result.expiry_date.as_deref(), Some("03.04.2027"));

        let attempt = &result.diagnostics.matches[&Category::ExpiryDate];
        assert_eq!(attempt.pattern_index, 1);
        assert_eq!(attempt.matches.len(), 2);
    }

    #[test]
    fn test_thirteen_digit_barcode_preferred() {
        let result = LabelExtractor::new().extract("code 96385074\nEAN 5000112637922");
        assert_eq!(result.barcode.as_deref(), Some("5000112637922"));
    }

    #[test]
    fn test_eight_digit_barcode_fallback() {
        let result = LabelExtractor::new().extract("code 96385074");
        assert_eq!(result.barcode.as_deref(), Some("96385074"));
        assert_eq!(result.diagnostics.matches[&Category::Barcode].pattern_index, 1);
    }

    #[test]
    fn test_confidence_product_and_barcode_only() {
        let result = extractor_without_name_patterns().extract("Sparkling Water\n96385074");
        assert_eq!(result.product_name.as_deref(), Some("Sparkling Water"));
        assert_eq!(result.barcode.as_deref(), Some("96385074"));
        assert!(result.expiry_date.is_none());
        assert!(result.quantity.is_none());
        assert_eq!(result.confidence, 30 + 10);
    }

    #[test]
    fn test_product_name_fallback() {
        let text = ["", "ok", "Organic Whole Milk 1L", "exp 2026", "999"].join("\n");
        let result = extractor_without_name_patterns().extract(&text);

        assert_eq!(result.product_name.as_deref(), Some("Organic Whole Milk 1L"));
        assert_eq!(
            result.diagnostics.product_name_fallback,
            Some(NameFallback::Line { index: 2 })
        );
        assert!(!result.diagnostics.matches.contains_key(&Category::ProductName));
    }

    #[test]
    fn test_unknown_product_still_earns_weight() {
        let result = extractor_without_name_patterns().extract("1\n22\n333\n4444\n55555\nzzz yyy xxx");
        assert_eq!(result.product_name.as_deref(), Some(UNKNOWN_PRODUCT));
        assert_eq!(result.confidence, 30);
    }

    #[test]
    fn test_matched_but_empty_keeps_diagnostics_without_weight() {
        let mut config = ExtractionConfig::default();
        config.patterns.insert(
            Category::ExpiryDate,
            vec![r"(best before)\s+([a-z]+)".to_string()],
        );
        let extractor = LabelExtractor::from_config(&config).unwrap();

        let result = extractor.extract("Best before soon");
        assert!(result.expiry_date.is_none());
        assert!(result.diagnostics.matches.contains_key(&Category::ExpiryDate));
        assert!(!result.is_resolved(Category::ExpiryDate));
        // Only the product name line earns weight.
        assert_eq!(result.product_name.as_deref(), Some("Best before soon"));
        assert_eq!(result.confidence, 30);
    }

    #[test]
    fn test_diagnostics_keep_at_most_three_matches() {
        let result = LabelExtractor::new().extract("1kg 2kg 3kg 4kg 5kg");
        let attempt = &result.diagnostics.matches[&Category::Quantity];
        assert_eq!(attempt.matches.len(), 3);
        assert_eq!(result.quantity.as_deref(), Some("1"));
        assert_eq!(attempt.matches[0].groups, vec!["1".to_string(), "kg".to_string()]);
    }

    #[test]
    fn test_quantity_labeled_fallback() {
        let result = LabelExtractor::new().extract("Quantity: 12");
        assert_eq!(result.quantity.as_deref(), Some("12"));
    }

    #[test]
    fn test_deterministic() {
        let extractor = LabelExtractor::new();
        let text = "Chocolat Noir\nA consommer avant 01/02/27\n100 g\n7622210449283";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn test_confidence_bounded_for_odd_inputs() {
        let extractor = LabelExtractor::new();
        for text in ["\n\n\n", "\u{0}\u{feff}", "💥💥💥💥💥💥", "\r\n\r\n", &"9".repeat(10_000)] {
            let result = extractor.extract(text);
            assert!(result.confidence <= 100);
            assert!(result.product_name.is_some());
        }
    }

    #[test]
    fn test_custom_weights_have_no_fixed_ceiling() {
        let mut config = ExtractionConfig::default();
        config.weights = BTreeMap::from([
            (Category::ExpiryDate, 100),
            (Category::ProductName, 50),
            (Category::Quantity, 25),
            (Category::Barcode, 25),
        ]);
        let extractor = LabelExtractor::from_config(&config).unwrap();
        let result = extractor.extract("MILK\nexp 01/01/27\n1 l\n3017620422003");
        assert_eq!(result.confidence, 200);
    }

    #[test]
    fn test_invalid_config_gives_degraded_result() {
        let mut config = ExtractionConfig::default();
        config.patterns.insert(Category::Barcode, vec!["([0-9]{13}".to_string()]);

        let result = extract_label("MILK 3017620422003", &config);
        assert_eq!(result.product_name.as_deref(), Some(PROCESSING_ERROR));
        assert_eq!(result.confidence, DEGRADED_CONFIDENCE);
        assert!(result.barcode.is_none());
        assert!(result.diagnostics.error.is_some());
    }

    #[test]
    fn test_missing_weight_gives_degraded_result() {
        let mut config = ExtractionConfig::default();
        config.weights.remove(&Category::Quantity);

        let result = extract_label("anything", &config);
        assert!(result.is_degraded());
        assert_eq!(result.confidence, DEGRADED_CONFIDENCE);
    }

    #[test]
    fn test_overflowing_weights_give_degraded_result() {
        let mut config = ExtractionConfig::default();
        config.weights = BTreeMap::from([
            (Category::ExpiryDate, u32::MAX),
            (Category::ProductName, 1),
            (Category::Quantity, 1),
            (Category::Barcode, 1),
        ]);

        assert_eq!(
            LabelExtractor::from_config(&config).unwrap_err(),
            ConfigError::WeightOverflow
        );

        let result = extract_label("MILK\nexp 01/01/27", &config);
        assert!(result.is_degraded());
        assert_eq!(result.product_name.as_deref(), Some(PROCESSING_ERROR));
        assert_eq!(result.confidence, DEGRADED_CONFIDENCE);
        assert!(result.expiry_date.is_none());
    }

    #[test]
    fn test_extract_label_matches_extractor() {
        let text = "GREEK YOGURT\nEXP 09-09-2026\n500g";
        let config = ExtractionConfig {
            patterns: default_patterns(),
            ..ExtractionConfig::default()
        };
        assert_eq!(extract_label(text, &config), LabelExtractor::new().extract(text));
    }
}
