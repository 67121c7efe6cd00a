//! Core library for product label scanning.
//!
//! This crate provides:
//! - Pattern-based field extraction from OCR text (product name, expiry date,
//!   quantity, barcode) with per-field diagnostics
//! - Weighted confidence scoring
//! - The scan pipeline wiring image retrieval, OCR, storage and notification
//!   collaborators around the extractor
//! - Label data models and JSON configuration

pub mod error;
pub mod models;
pub mod extract;
pub mod pipeline;

pub use error::{ConfigError, ExtractionError, PipelineError, ShelfError, StageError, Result};
pub use models::config::{ExtractionConfig, PipelineConfig, ShelfConfig};
pub use models::label::{
    Category, Diagnostics, ExtractionResult, MatchAttempt, NameFallback, RawMatch,
};
pub use models::record::{ExpiryStatus, LabelRecord, ReviewStatus, ReviewUpdate};
pub use extract::{extract_label, ConfidenceWeights, LabelExtractor, PatternTable};
pub use pipeline::{LabelPipeline, ProcessedLabel, ScanRequest};
