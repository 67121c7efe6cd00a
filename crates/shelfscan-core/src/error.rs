//! Error types for the shelfscan-core library.

use thiserror::Error;

use crate::models::label::Category;

/// Main error type for the shelfscan library.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Scan pipeline error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning configuration data into a pattern table
/// and weight table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A pattern failed to compile.
    #[error("invalid pattern #{index} for {category}: {reason}")]
    InvalidPattern {
        category: Category,
        index: usize,
        reason: String,
    },

    /// A category has patterns but no weight.
    #[error("no confidence weight configured for {0}")]
    MissingWeight(Category),

    /// Weights must be positive.
    #[error("confidence weight for {0} must be positive")]
    ZeroWeight(Category),

    /// The weights add up to more than a `u32` can hold.
    #[error("confidence weights add up to more than u32::MAX")]
    WeightOverflow,

    /// A category name that is not one of the four known fields.
    #[error("unknown field category: {0}")]
    UnknownCategory(String),
}

/// Errors raised inside a single extraction call.
///
/// These never reach callers of [`crate::LabelExtractor::extract`]; they are
/// folded into a degraded result at the call boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The extractor could not be built from its configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A match did not carry the capture group its normalizer asked for.
    #[error("pattern #{pattern_index} for {category} has no capture group {group}")]
    MatchShape {
        category: Category,
        pattern_index: usize,
        group: usize,
    },
}

/// Failure of a single collaborator stage (download, OCR, storage,
/// persistence, notification).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed: {reason}")]
pub struct StageError {
    /// Stage name, used in logs.
    pub stage: &'static str,
    /// Collaborator-supplied reason.
    pub reason: String,
}

impl StageError {
    pub fn new(stage: &'static str, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Errors that abort the scan pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The photo could not be downloaded.
    #[error("image retrieval failed: {0}")]
    ImageRetrieval(StageError),

    /// The photo could not be stored.
    #[error("image storage failed: {0}")]
    ImageStorage(StageError),

    /// The text recognition service failed.
    #[error("text recognition failed: {0}")]
    Recognition(StageError),

    /// Recognition succeeded but produced no text.
    #[error("no text recognized in image {0}")]
    NoText(String),
}

/// Result type for the shelfscan library.
pub type Result<T> = std::result::Result<T, ShelfError>;
