//! Stored scan records and the review workflow.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::label::ExtractionResult;

/// Days before expiry at which a product counts as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 3;

/// Review state of a stored scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting user confirmation.
    #[default]
    Pending,
    /// Accepted or corrected by the user.
    Validated,
}

/// A user's answer to a scan summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    /// Corrected product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// Corrected expiry date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
}

/// Freshness of a product relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Fresh,
    /// No expiry date, or one that does not read as a calendar date.
    Unknown,
}

impl ExpiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "expired",
            ExpiryStatus::ExpiringSoon => "expiring soon",
            ExpiryStatus::Fresh => "fresh",
            ExpiryStatus::Unknown => "unknown",
        }
    }
}

/// A processed label as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Freshly generated record identifier.
    pub id: Uuid,

    /// Opaque identifier of the source chat message / file.
    pub source_id: String,

    /// Chat or user that sent the photo.
    pub chat_id: i64,

    /// Storage key of the photo.
    pub image_key: String,

    /// Storage key of the recognized text.
    pub text_key: String,

    /// Start of the recognized text.
    pub raw_text_preview: String,

    /// Text recognition provider.
    pub ocr_provider: String,

    /// Extracted fields.
    #[serde(flatten)]
    pub extraction: ExtractionResult,

    /// Review state.
    pub status: ReviewStatus,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl LabelRecord {
    /// Apply a review, marking the record validated.
    pub fn apply_review(&mut self, update: ReviewUpdate) {
        if let Some(name) = update.product_name {
            self.extraction.product_name = Some(name);
        }
        if let Some(expiry) = update.expiry_date {
            self.extraction.expiry_date = Some(expiry).filter(|e| !e.trim().is_empty());
        }
        self.status = ReviewStatus::Validated;
        self.reviewed_at = Some(Utc::now());
    }

    /// Classify the expiry date relative to `today`.
    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        classify_expiry(self.extraction.expiry_date.as_deref(), today)
    }
}

/// Classify an extracted expiry token relative to `today`.
pub fn classify_expiry(expiry: Option<&str>, today: NaiveDate) -> ExpiryStatus {
    let Some(date) = expiry.and_then(read_expiry_date) else {
        return ExpiryStatus::Unknown;
    };

    let days_left = (date - today).num_days();
    if days_left < 0 {
        ExpiryStatus::Expired
    } else if days_left <= EXPIRING_SOON_DAYS {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Fresh
    }
}

/// Best-effort day-first reading of an extracted expiry token
/// (`DD/MM/YY`, `DD.MM.YYYY`, `D-M-YY`, ...).
///
/// Display helper only; stored tokens are never rewritten.
pub fn read_expiry_date(token: &str) -> Option<NaiveDate> {
    let mut parts = token.split(['/', '-', '.']).filter(|p| !p.is_empty());
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year_part = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let year: i32 = year_part.parse().ok()?;
    let year = match year_part.len() {
        2 => 2000 + year,
        4 => year,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expiry: Option<&str>) -> LabelRecord {
        LabelRecord {
            id: Uuid::new_v4(),
            source_id: "file-1".to_string(),
            chat_id: 42,
            image_key: "images/file-1.jpg".to_string(),
            text_key: "text/file-1.txt".to_string(),
            raw_text_preview: String::new(),
            ocr_provider: "test".to_string(),
            extraction: ExtractionResult {
                product_name: Some("Milk".to_string()),
                expiry_date: expiry.map(str::to_string),
                confidence: 70,
                ..ExtractionResult::default()
            },
            status: ReviewStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_read_expiry_date() {
        assert_eq!(read_expiry_date("12/05/26"), Some(day(2026, 5, 12)));
        assert_eq!(read_expiry_date("1.2.2027"), Some(day(2027, 2, 1)));
        assert_eq!(read_expiry_date("31-02-26"), None);
        assert_eq!(read_expiry_date("12/05/202"), None);
        assert_eq!(read_expiry_date("2026"), None);
    }

    #[test]
    fn test_expiry_status() {
        let today = day(2026, 5, 10);
        assert_eq!(record(Some("09/05/26")).expiry_status(today), ExpiryStatus::Expired);
        assert_eq!(record(Some("12/05/26")).expiry_status(today), ExpiryStatus::ExpiringSoon);
        assert_eq!(record(Some("10/05/26")).expiry_status(today), ExpiryStatus::ExpiringSoon);
        assert_eq!(record(Some("20/06/2026")).expiry_status(today), ExpiryStatus::Fresh);
        assert_eq!(record(None).expiry_status(today), ExpiryStatus::Unknown);
        assert_eq!(record(Some("99/99/99")).expiry_status(today), ExpiryStatus::Unknown);
    }

    #[test]
    fn test_apply_review() {
        let mut rec = record(Some("12/05/26"));
        rec.apply_review(ReviewUpdate {
            product_name: None,
            expiry_date: Some("13/05/26".to_string()),
        });
        assert_eq!(rec.status, ReviewStatus::Validated);
        assert_eq!(rec.extraction.product_name.as_deref(), Some("Milk"));
        assert_eq!(rec.extraction.expiry_date.as_deref(), Some("13/05/26"));
        assert!(rec.reviewed_at.is_some());
    }

    #[test]
    fn test_accept_without_changes() {
        let mut rec = record(Some("12/05/26"));
        rec.apply_review(ReviewUpdate::default());
        assert_eq!(rec.status, ReviewStatus::Validated);
        assert_eq!(rec.extraction.expiry_date.as_deref(), Some("12/05/26"));
    }

    #[test]
    fn test_record_json_is_flat() {
        let json = serde_json::to_value(record(Some("12/05/26"))).unwrap();
        assert_eq!(json["product_name"], "Milk");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["confidence"], 70);

        let back: LabelRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.extraction.expiry_date.as_deref(), Some("12/05/26"));
    }
}
