//! Label extraction models: field categories, raw matches and the
//! extraction result handed to callers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Product name used when the text yields nothing usable.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Product name of a degraded result.
pub const PROCESSING_ERROR: &str = "Processing Error";

/// Confidence reported for a degraded result.
pub const DEGRADED_CONFIDENCE: u32 = 20;

/// Maximum raw matches kept per category in diagnostics.
pub const MAX_DIAGNOSTIC_MATCHES: usize = 3;

/// One of the extractable label fields.
///
/// The declaration order is the order fields are resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Expiry / best-before date.
    ExpiryDate,
    /// Product name.
    ProductName,
    /// Net quantity (numeric portion).
    Quantity,
    /// EAN-13 or EAN-8 barcode digits.
    Barcode,
}

impl Category {
    /// All categories in resolution order.
    pub const ALL: [Category; 4] = [
        Category::ExpiryDate,
        Category::ProductName,
        Category::Quantity,
        Category::Barcode,
    ];

    /// Configuration key of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ExpiryDate => "expiry_date",
            Category::ProductName => "product_name",
            Category::Quantity => "quantity",
            Category::Barcode => "barcode",
        }
    }

    /// Capture group the normalizer reads for a pattern with
    /// `group_count` capture groups.
    ///
    /// Labeled expiry patterns capture the label first and the date second.
    pub fn value_group(&self, group_count: usize) -> usize {
        match self {
            Category::ExpiryDate if group_count > 1 => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// A single regex hit: the whole matched text plus its capture groups.
///
/// Groups that did not participate in the match are stored as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    /// Full matched text.
    pub whole: String,

    /// Capture groups in pattern order (group 0 here is the first
    /// parenthesized group, not the whole match).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    /// Byte offset of the match in the source text.
    pub start: usize,
}

impl RawMatch {
    /// Text of the requested capture group.
    ///
    /// A pattern without capture groups yields its whole match for group 0.
    pub fn group(&self, index: usize) -> Option<&str> {
        if self.groups.is_empty() && index == 0 {
            return Some(&self.whole);
        }
        self.groups.get(index).map(String::as_str)
    }
}

/// The pattern that resolved a category and the first few raw matches it
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAttempt {
    /// Category the pattern belongs to.
    pub category: Category,

    /// Pattern source text.
    pub pattern: String,

    /// Position of the pattern in its category list.
    pub pattern_index: usize,

    /// Up to three raw matches, in text order.
    pub matches: Vec<RawMatch>,
}

/// How the product name was obtained when no pattern yielded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NameFallback {
    /// Taken from one of the first lines of the text (zero-based).
    Line { index: usize },
    /// No line qualified.
    Unknown,
}

/// Per-category provenance of an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Categories for which a pattern matched, even if the normalized value
    /// turned out empty.
    #[serde(default)]
    pub matches: BTreeMap<Category, MatchAttempt>,

    /// Set when the product name came from the line heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name_fallback: Option<NameFallback>,

    /// Error message of a degraded extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured fields extracted from a label's OCR text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Product name.
    pub product_name: Option<String>,

    /// Expiry date token as printed (digits and `/ - .` only).
    pub expiry_date: Option<String>,

    /// Numeric quantity.
    pub quantity: Option<String>,

    /// Barcode digits.
    pub barcode: Option<String>,

    /// Sum of the weights of all resolved fields.
    pub confidence: u32,

    /// Which pattern produced each field.
    pub diagnostics: Diagnostics,
}

impl ExtractionResult {
    /// Result returned when extraction failed internally.
    pub fn degraded(error: impl fmt::Display) -> Self {
        Self {
            product_name: Some(PROCESSING_ERROR.to_string()),
            confidence: DEGRADED_CONFIDENCE,
            diagnostics: Diagnostics {
                error: Some(error.to_string()),
                ..Diagnostics::default()
            },
            ..Self::default()
        }
    }

    /// Resolved value of a category.
    pub fn value(&self, category: Category) -> Option<&str> {
        match category {
            Category::ExpiryDate => self.expiry_date.as_deref(),
            Category::ProductName => self.product_name.as_deref(),
            Category::Quantity => self.quantity.as_deref(),
            Category::Barcode => self.barcode.as_deref(),
        }
    }

    pub(crate) fn set_value(&mut self, category: Category, value: Option<String>) {
        let slot = match category {
            Category::ExpiryDate => &mut self.expiry_date,
            Category::ProductName => &mut self.product_name,
            Category::Quantity => &mut self.quantity,
            Category::Barcode => &mut self.barcode,
        };
        *slot = value;
    }

    /// Whether a category ended up with a non-empty value.
    pub fn is_resolved(&self, category: Category) -> bool {
        self.value(category).is_some_and(|v| !v.is_empty())
    }

    /// Whether this is a degraded result.
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.error.is_some()
    }
}
