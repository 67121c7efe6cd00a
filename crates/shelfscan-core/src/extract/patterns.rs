//! Default pattern table and confidence weights for product labels.
//!
//! Patterns are compiled case-insensitive and multi-line, so `[A-Z]` also
//! accepts lowercase letters and `^`/`$` anchor at line boundaries.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use super::table::{ConfidenceWeights, PatternTable};
use crate::models::label::Category;

// Expiry date: labeled form (English and French markers), then any date-like token.
pub const EXPIRY_LABELED: &str = r"(exp|expir|use by|best before|[àa] consommer avant|[àa] consommer de pr[ée]f[ée]rence avant|dlc|ddm)[^0-9]*([0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{2,4})";
pub const EXPIRY_BARE: &str = r"([0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{2,4})";

// Product name: a whole line of letters, then any short capitalized run.
pub const PRODUCT_LINE: &str = r"^([A-Z][A-Za-z \t]+)$";
pub const PRODUCT_PHRASE: &str = r"([A-Z][A-Za-z\s]{3,30})";

// Quantity: number with unit, then "quantity: N".
pub const QUANTITY_WITH_UNIT: &str = r"([0-9]+)\s*(g|kg|ml|l|pcs|pieces)";
pub const QUANTITY_LABELED: &str = r"quantity[:\s]*([0-9]+)";

// Barcode: EAN-13 before EAN-8.
pub const BARCODE_EAN13: &str = r"([0-9]{13})";
pub const BARCODE_EAN8: &str = r"([0-9]{8})";

/// Default pattern sources per category, in priority order.
pub fn default_patterns() -> BTreeMap<Category, Vec<String>> {
    let table: [(Category, &[&str]); 4] = [
        (Category::ExpiryDate, &[EXPIRY_LABELED, EXPIRY_BARE]),
        (Category::ProductName, &[PRODUCT_LINE, PRODUCT_PHRASE]),
        (Category::Quantity, &[QUANTITY_WITH_UNIT, QUANTITY_LABELED]),
        (Category::Barcode, &[BARCODE_EAN13, BARCODE_EAN8]),
    ];

    table
        .into_iter()
        .map(|(category, sources)| {
            (category, sources.iter().map(|s| s.to_string()).collect())
        })
        .collect()
}

/// Default confidence weights (40/30/20/10).
pub fn default_weights() -> BTreeMap<Category, u32> {
    BTreeMap::from([
        (Category::ExpiryDate, 40),
        (Category::ProductName, 30),
        (Category::Quantity, 20),
        (Category::Barcode, 10),
    ])
}

lazy_static! {
    pub static ref DEFAULT_TABLE: PatternTable =
        PatternTable::compile(&default_patterns()).unwrap();

    pub static ref DEFAULT_WEIGHTS: ConfidenceWeights =
        ConfidenceWeights::new(default_weights()).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(category: Category, index: usize, text: &str) -> Option<Vec<String>> {
        DEFAULT_TABLE.patterns(category)[index]
            .find_matches(text, 1)
            .into_iter()
            .next()
            .map(|m| m.groups)
    }

    #[test]
    fn test_default_table_compiles() {
        for category in Category::ALL {
            assert_eq!(DEFAULT_TABLE.patterns(category).len(), 2);
        }
        assert_eq!(DEFAULT_WEIGHTS.total(), 100);
    }

    #[test]
    fn test_expiry_labels() {
        let cases = [
            ("EXP: 12/05/26", "EXP", "12/05/26"),
            ("Best before 01.02.2027", "Best before", "01.02.2027"),
            ("use by 3-4-25", "use by", "3-4-25"),
            ("À consommer avant le 15/08/2026", "À consommer avant", "15/08/2026"),
            ("A consommer de préférence avant fin 09/10/26", "A consommer de préférence avant", "09/10/26"),
            ("DLC 30.11.25", "DLC", "30.11.25"),
        ];
        for (text, label, date) in cases {
            let groups = first_match(Category::ExpiryDate, 0, text).unwrap();
            assert_eq!(groups, vec![label.to_string(), date.to_string()], "{text}");
        }
    }

    #[test]
    fn test_bare_date() {
        let groups = first_match(Category::ExpiryDate, 1, "lot 7 / 05-11-2026").unwrap();
        assert_eq!(groups, vec!["05-11-2026".to_string()]);
        assert!(first_match(Category::ExpiryDate, 1, "2026").is_none());
    }

    #[test]
    fn test_product_line_stays_on_one_line() {
        let groups = first_match(Category::ProductName, 0, "12345\nGreek Yogurt\n500g").unwrap();
        assert_eq!(groups, vec!["Greek Yogurt".to_string()]);
    }

    #[test]
    fn test_quantity_patterns() {
        let groups = first_match(Category::Quantity, 0, "Net wt 500 g").unwrap();
        assert_eq!(groups, vec!["500".to_string(), "g".to_string()]);

        let groups = first_match(Category::Quantity, 0, "12pieces").unwrap();
        assert_eq!(groups, vec!["12".to_string(), "pieces".to_string()]);

        let groups = first_match(Category::Quantity, 1, "Quantity: 6").unwrap();
        assert_eq!(groups, vec!["6".to_string()]);
    }

    #[test]
    fn test_barcode_lengths() {
        let groups = first_match(Category::Barcode, 0, "EAN 3017620422003").unwrap();
        assert_eq!(groups, vec!["3017620422003".to_string()]);
        assert!(first_match(Category::Barcode, 0, "96385074").is_none());

        let groups = first_match(Category::Barcode, 1, "96385074").unwrap();
        assert_eq!(groups, vec!["96385074".to_string()]);
    }
}
