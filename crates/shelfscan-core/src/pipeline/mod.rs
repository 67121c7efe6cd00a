//! Scan pipeline: photo retrieval, text recognition, extraction, storage
//! and notification.
//!
//! Every collaborator is a trait so transports (chat APIs, object stores,
//! OCR services, databases) stay outside this crate. Retrieval and
//! recognition failures abort a scan; storage, persistence and notification
//! failures are logged and the scan continues.

mod summary;

pub use summary::{
    confidence_percent, render_fallback_summary, render_summary, review_actions, ReviewAction,
    ReviewKind, ACTION_PROMPT,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, StageError};
use crate::extract::normalize::truncate_chars;
use crate::extract::LabelExtractor;
use crate::models::config::PipelineConfig;
use crate::models::label::ExtractionResult;
use crate::models::record::{LabelRecord, ReviewStatus};

/// Result type of a collaborator stage.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Downloads label photos from the chat platform.
pub trait ImageSource {
    fn fetch(&self, file_id: &str) -> StageResult<Vec<u8>>;
}

/// Blob storage for photos and recognized text.
pub trait ObjectStore {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> StageResult<()>;
}

/// Text recognition service.
pub trait TextRecognizer {
    /// Recognized lines of a stored photo, in reading order.
    fn recognize(&self, image_key: &str) -> StageResult<Vec<String>>;
}

/// Persistence for processed labels.
pub trait RecordStore {
    fn save(&self, record: &LabelRecord) -> StageResult<()>;
}

/// Chat notifications.
pub trait Notifier {
    fn send_text(&self, chat_id: i64, text: &str) -> StageResult<()>;

    fn send_actions(&self, chat_id: i64, prompt: &str, actions: &[ReviewAction]) -> StageResult<()>;
}

/// A photo to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Platform file identifier of the photo.
    pub file_id: String,
    /// Chat that sent the photo.
    pub chat_id: i64,
}

/// How the summary message reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryDelivery {
    Sent,
    /// Only the short fallback summary went through.
    FallbackSent,
    Failed,
}

/// Notification outcome of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub summary: SummaryDelivery,
    pub actions_sent: bool,
}

/// A completed scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedLabel {
    pub record: LabelRecord,
    /// Whether the record store accepted the record.
    pub persisted: bool,
    pub notification: NotificationOutcome,
}

/// Orchestrates the collaborators around a [`LabelExtractor`].
pub struct LabelPipeline {
    images: Box<dyn ImageSource + Send + Sync>,
    store: Box<dyn ObjectStore + Send + Sync>,
    recognizer: Box<dyn TextRecognizer + Send + Sync>,
    records: Box<dyn RecordStore + Send + Sync>,
    notifier: Box<dyn Notifier + Send + Sync>,
    extractor: LabelExtractor,
    config: PipelineConfig,
}

impl LabelPipeline {
    /// Create a pipeline with the default extractor and configuration.
    pub fn new(
        images: impl ImageSource + Send + Sync + 'static,
        store: impl ObjectStore + Send + Sync + 'static,
        recognizer: impl TextRecognizer + Send + Sync + 'static,
        records: impl RecordStore + Send + Sync + 'static,
        notifier: impl Notifier + Send + Sync + 'static,
    ) -> Self {
        Self {
            images: Box::new(images),
            store: Box::new(store),
            recognizer: Box::new(recognizer),
            records: Box::new(records),
            notifier: Box::new(notifier),
            extractor: LabelExtractor::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Use a custom extractor.
    pub fn with_extractor(mut self, extractor: LabelExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn extractor(&self) -> &LabelExtractor {
        &self.extractor
    }

    /// Scan one photo.
    pub fn process(&self, request: &ScanRequest) -> Result<ProcessedLabel, PipelineError> {
        info!("Processing label photo {} from chat {}", request.file_id, request.chat_id);

        let image_key = self.store_image(&request.file_id)?;
        let raw_text = self.recognize(&image_key)?;
        let text_key = self.store_text(&request.file_id, &raw_text);

        let extraction = self.extractor.extract(&raw_text);

        let record = LabelRecord {
            id: Uuid::new_v4(),
            source_id: request.file_id.clone(),
            chat_id: request.chat_id,
            image_key,
            text_key,
            raw_text_preview: truncate_chars(&raw_text, self.config.raw_text_preview_chars),
            ocr_provider: self.config.ocr_provider.clone(),
            extraction,
            status: ReviewStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        };

        let persisted = match self.records.save(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!("Record {} not saved: {}", record.id, e);
                false
            }
        };

        let notification = self.notify(request, &record.extraction);

        info!(
            "Label {} processed: '{}' (confidence {})",
            record.id,
            record.extraction.product_name.as_deref().unwrap_or_default(),
            record.extraction.confidence
        );

        Ok(ProcessedLabel {
            record,
            persisted,
            notification,
        })
    }

    fn store_image(&self, file_id: &str) -> Result<String, PipelineError> {
        let image = self.images.fetch(file_id).map_err(PipelineError::ImageRetrieval)?;
        debug!("Downloaded {} bytes for {}", image.len(), file_id);

        let key = format!("{}{}.jpg", self.config.image_prefix, file_id);
        self.store
            .put(&key, &image, "image/jpeg")
            .map_err(PipelineError::ImageStorage)?;

        Ok(key)
    }

    fn recognize(&self, image_key: &str) -> Result<String, PipelineError> {
        let lines = self
            .recognizer
            .recognize(image_key)
            .map_err(PipelineError::Recognition)?;
        debug!("Recognized {} lines in {}", lines.len(), image_key);

        let text = lines.join("\n");
        if text.trim().is_empty() {
            return Err(PipelineError::NoText(image_key.to_string()));
        }
        Ok(text)
    }

    /// Store recognized text. The key is recorded even if the write fails.
    fn store_text(&self, file_id: &str, text: &str) -> String {
        let key = format!("{}{}.txt", self.config.text_prefix, file_id);
        if let Err(e) = self.store.put(&key, text.as_bytes(), "text/plain") {
            warn!("Recognized text not stored at {}: {}", key, e);
        }
        key
    }

    fn notify(&self, request: &ScanRequest, extraction: &ExtractionResult) -> NotificationOutcome {
        let summary = render_summary(
            extraction,
            self.extractor.weights().total(),
            &self.config.ocr_provider,
        );

        let delivery = match self.notifier.send_text(request.chat_id, &summary) {
            Ok(()) => SummaryDelivery::Sent,
            Err(e) => {
                warn!("Summary not delivered to chat {}: {}", request.chat_id, e);
                match self
                    .notifier
                    .send_text(request.chat_id, &render_fallback_summary(extraction))
                {
                    Ok(()) => SummaryDelivery::FallbackSent,
                    Err(e) => {
                        warn!("Fallback summary not delivered to chat {}: {}", request.chat_id, e);
                        SummaryDelivery::Failed
                    }
                }
            }
        };

        let actions_sent = delivery == SummaryDelivery::Sent && {
            let actions = review_actions(&request.file_id, self.config.action_id_chars);
            match self.notifier.send_actions(request.chat_id, ACTION_PROMPT, &actions) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Review actions not delivered to chat {}: {}", request.chat_id, e);
                    false
                }
            }
        };

        NotificationOutcome {
            summary: delivery,
            actions_sent,
        }
    }
}
