use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Language;

/// A per-language summary of a document's relevant content.
///
/// Unique per (document, language); the schema constraint is the
/// authoritative guard, see `db::repository::summary`. `text` is never
/// empty: a deterministic fallback is recorded when generation fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: Uuid,
    pub document_id: Uuid,
    pub language: Language,
    pub text: String,
    /// The relevant excerpt the summary was generated from.
    pub original_text: Option<String>,
    /// Plain-language impact explanation, back-filled after creation.
    pub explanation: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Summary {
    pub fn new(
        document_id: Uuid,
        language: Language,
        text: String,
        original_text: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            language,
            text,
            original_text,
            explanation: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_summary_has_no_explanation() {
        let summary = Summary::new(
            Uuid::new_v4(),
            Language::En,
            "Budget allocates funds for maternal health.".into(),
            Some("raw excerpt".into()),
        );
        assert!(summary.explanation.is_none());
        assert_eq!(summary.language, Language::En);
    }
}
