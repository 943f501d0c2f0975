use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ProcessingStatus;

/// A government budget document registered for processing.
///
/// Exactly one of `pdf_url` / `local_file` is set at creation; the
/// repository rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub pdf_url: Option<String>,
    pub local_file: Option<String>,
    pub verification_url: Option<String>,
    pub verified: bool,
    pub region_id: Uuid,
    pub uploaded_at: NaiveDateTime,
    pub processing_status: ProcessingStatus,
}

impl Document {
    /// Build a new unprocessed document stamped with the current time.
    pub fn new(
        title: &str,
        pdf_url: Option<String>,
        local_file: Option<String>,
        region_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            pdf_url,
            local_file,
            verification_url: None,
            verified: false,
            region_id,
            uploaded_at: chrono::Utc::now().naive_utc(),
            processing_status: ProcessingStatus::Unprocessed,
        }
    }

    /// The URL a fact check should cite: the verification URL when set,
    /// otherwise the source PDF URL.
    pub fn fact_check_source_url(&self) -> String {
        self.verification_url
            .clone()
            .or_else(|| self.pdf_url.clone())
            .unwrap_or_default()
    }
}
