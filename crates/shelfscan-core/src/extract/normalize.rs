//! Per-category cleaning of raw matches and the product name heuristic.

use crate::error::ExtractionError;
use crate::models::label::{Category, NameFallback, RawMatch, UNKNOWN_PRODUCT};

/// Maximum characters of a pattern-matched product name.
pub const PRODUCT_NAME_MAX_CHARS: usize = 50;

/// Maximum characters of a product name taken from a text line.
pub const FALLBACK_NAME_MAX_CHARS: usize = 40;

/// Lines inspected by the product name heuristic.
pub const FALLBACK_LINES: usize = 5;

/// A line qualifies for the heuristic when its trimmed length exceeds this.
pub const FALLBACK_MIN_CHARS: usize = 5;

/// Turn the first raw match of a pattern into the category's value.
///
/// Returns `Ok(None)` when cleaning leaves nothing.
pub fn normalize(
    category: Category,
    pattern_index: usize,
    group_count: usize,
    raw: &RawMatch,
) -> Result<Option<String>, ExtractionError> {
    let group = category.value_group(group_count);
    let value = raw.group(group).ok_or(ExtractionError::MatchShape {
        category,
        pattern_index,
        group,
    })?;

    let cleaned = match category {
        Category::ExpiryDate => clean_date(value),
        Category::ProductName => clean_product_name(value),
        Category::Quantity | Category::Barcode => value.to_string(),
    };

    Ok(Some(cleaned).filter(|v| !v.is_empty()))
}

/// Keep only digits and the date separators `/`, `-` and `.`.
pub fn clean_date(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '/' | '-' | '.'))
        .collect()
}

/// Trim and cap a product name.
pub fn clean_product_name(value: &str) -> String {
    truncate_chars(value.trim(), PRODUCT_NAME_MAX_CHARS)
}

/// Pick a product name from the first lines of the text.
pub fn fallback_product_name(text: &str) -> (String, NameFallback) {
    text.split('\n')
        .take(FALLBACK_LINES)
        .enumerate()
        .find_map(|(index, line)| {
            let line = line.trim();
            (line.chars().count() > FALLBACK_MIN_CHARS).then(|| {
                (
                    truncate_chars(line, FALLBACK_NAME_MAX_CHARS),
                    NameFallback::Line { index },
                )
            })
        })
        .unwrap_or_else(|| (UNKNOWN_PRODUCT.to_string(), NameFallback::Unknown))
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
