//! Configuration structures for label extraction and the scan pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::patterns::{default_patterns, default_weights};
use crate::models::label::Category;

/// Main configuration for shelfscan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Pattern table and confidence weights.
    pub extraction: ExtractionConfig,

    /// Scan pipeline configuration.
    pub pipeline: PipelineConfig,
}

/// Pattern table and weights as plain, versionable data.
///
/// Compiled into a [`crate::PatternTable`] and [`crate::ConfidenceWeights`]
/// when an extractor is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Ordered pattern sources per category; earlier patterns win.
    pub patterns: BTreeMap<Category, Vec<String>>,

    /// Weight each resolved category adds to the confidence score.
    pub weights: BTreeMap<Category, u32>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            weights: default_weights(),
        }
    }
}

/// Scan pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Storage key prefix for label photos.
    pub image_prefix: String,

    /// Storage key prefix for recognized text.
    pub text_prefix: String,

    /// Characters of recognized text kept on the stored record.
    pub raw_text_preview_chars: usize,

    /// Characters of the source message id embedded in review actions.
    pub action_id_chars: usize,

    /// Name of the text recognition provider shown in summaries.
    pub ocr_provider: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_prefix: "images/".to_string(),
            text_prefix: "text/".to_string(),
            raw_text_preview_chars: 300,
            action_id_chars: 20,
            ocr_provider: "AWS Textract".to_string(),
        }
    }
}

impl ShelfConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
