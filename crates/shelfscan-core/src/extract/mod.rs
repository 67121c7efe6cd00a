//! Label field extraction module.

mod extractor;
pub mod normalize;
pub mod patterns;
pub mod table;

pub use extractor::{extract_label, LabelExtractor};
pub use table::{ConfidenceWeights, FieldPattern, PatternTable};
