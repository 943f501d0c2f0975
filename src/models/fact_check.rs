use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verification record attached to a summary.
///
/// Created lazily (get-or-create) and kept in sync with the owning
/// document's verification flag and URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheck {
    pub id: Uuid,
    pub summary_id: Uuid,
    pub source_url: String,
    pub is_verified: bool,
    pub checked_at: NaiveDateTime,
}

impl FactCheck {
    pub fn new(summary_id: Uuid, source_url: String, is_verified: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            summary_id,
            source_url,
            is_verified,
            checked_at: chrono::Utc::now().naive_utc(),
        }
    }
}
