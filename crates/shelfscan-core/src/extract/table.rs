//! Compiled pattern table and confidence weights.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;
use crate::models::label::{Category, ExtractionResult, RawMatch};

/// Upper bound on the compiled size of a single pattern.
const PATTERN_SIZE_LIMIT: usize = 4 * (1 << 20);

/// A compiled pattern for one category.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    regex: Regex,
    source: String,
}

impl FieldPattern {
    /// Compile a pattern source as a case-insensitive, multi-line search.
    pub fn compile(category: Category, index: usize, source: &str) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .multi_line(true)
            .crlf(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                category,
                index,
                reason: e.to_string(),
            })?;

        Ok(Self {
            regex,
            source: source.to_string(),
        })
    }

    /// Pattern source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of capture groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Up to `limit` non-overlapping matches in order of their start offset.
    pub fn find_matches(&self, text: &str, limit: usize) -> Vec<RawMatch> {
        self.regex
            .captures_iter(text)
            .take(limit)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let groups = caps
                    .iter()
                    .skip(1)
                    .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                Some(RawMatch {
                    whole: whole.as_str().to_string(),
                    groups,
                    start: whole.start(),
                })
            })
            .collect()
    }
}

/// Ordered patterns per category. Immutable once compiled.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: BTreeMap<Category, Vec<FieldPattern>>,
}

impl PatternTable {
    /// Compile pattern sources, preserving their order.
    pub fn compile(sources: &BTreeMap<Category, Vec<String>>) -> Result<Self, ConfigError> {
        let mut patterns = BTreeMap::new();

        for (&category, list) in sources {
            let compiled = list
                .iter()
                .enumerate()
                .map(|(index, source)| FieldPattern::compile(category, index, source))
                .collect::<Result<Vec<_>, _>>()?;
            patterns.insert(category, compiled);
        }

        Ok(Self { patterns })
    }

    /// Patterns of a category, highest priority first.
    pub fn patterns(&self, category: Category) -> &[FieldPattern] {
        self.patterns.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Categories that have at least one pattern.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.patterns
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(&category, _)| category)
    }
}

/// Weight each category contributes to the confidence score when resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceWeights {
    weights: BTreeMap<Category, u32>,
    total: u32,
}

impl ConfidenceWeights {
    /// Build a weight table. Every weight must be positive and the sum
    /// must fit in a `u32`.
    pub fn new(weights: BTreeMap<Category, u32>) -> Result<Self, ConfigError> {
        if let Some((&category, _)) = weights.iter().find(|(_, w)| **w == 0) {
            return Err(ConfigError::ZeroWeight(category));
        }

        let total = weights
            .values()
            .try_fold(0u32, |acc, &w| acc.checked_add(w))
            .ok_or(ConfigError::WeightOverflow)?;

        Ok(Self { weights, total })
    }

    /// Check that every category with patterns has a weight.
    pub fn check_covers(&self, table: &PatternTable) -> Result<(), ConfigError> {
        match table.categories().find(|c| !self.weights.contains_key(c)) {
            Some(category) => Err(ConfigError::MissingWeight(category)),
            None => Ok(()),
        }
    }

    /// Weight of a category, zero when unconfigured.
    pub fn weight(&self, category: Category) -> u32 {
        self.weights.get(&category).copied().unwrap_or(0)
    }

    /// Highest achievable score.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Sum of the weights of every category with a non-empty value.
    ///
    /// Never exceeds [`total`](Self::total).
    pub fn score(&self, result: &ExtractionResult) -> u32 {
        Category::ALL
            .into_iter()
            .filter(|&c| result.is_resolved(c))
            .map(|c| self.weight(c))
            .sum()
    }
}
