//! Summary query endpoint.
//!
//! Serves stored results only; generation happens in the background
//! pipeline, never on the request path.

use std::str::FromStr;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::enums::Language;

#[derive(Deserialize)]
pub struct SummaryListQuery {
    pub region: Option<String>,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct SummaryEntry {
    pub id: String,
    pub document_title: String,
    pub text: String,
    pub original_text: Option<String>,
    pub explanation: Option<String>,
    pub language: String,
    pub created_at: String,
    #[serde(rename = "factCheck")]
    pub fact_check: FactCheckEntry,
    pub region_name: String,
}

#[derive(Serialize)]
pub struct FactCheckEntry {
    pub source_url: String,
    pub is_verified: bool,
}

/// `GET /api/summaries?region=UG&language=en`: one entry per document
/// in the region that has a summary in the requested language.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<SummaryListQuery>,
) -> Result<Json<Vec<SummaryEntry>>, ApiError> {
    let region_code = query.region.unwrap_or_else(|| "UG".to_string());
    let language_code = query.language.unwrap_or_else(|| "en".to_string());

    let language = Language::from_str(&language_code)
        .map_err(|_| ApiError::BadRequest(format!("Unknown language code: {language_code}")))?;

    let conn = ctx.open_db()?;

    let region = repository::get_region_by_code(&conn, &region_code)?
        .ok_or_else(|| ApiError::NotFound(format!("Region {region_code} not found")))?;

    let documents = repository::list_documents_by_region(&conn, &region.id)?;

    let mut entries = Vec::new();
    for document in documents {
        // At most one entry per document: the first matching summary wins.
        let Some(summary) = repository::get_summary_for_document(&conn, &document.id, language)?
        else {
            continue;
        };

        let fact_check = repository::get_or_create_fact_check(
            &conn,
            &summary.id,
            &document.fact_check_source_url(),
            document.verified,
        )?;

        entries.push(SummaryEntry {
            id: summary.id.to_string(),
            document_title: document.title.clone(),
            text: summary.text,
            original_text: summary.original_text,
            explanation: summary.explanation,
            language: summary.language.as_str().to_string(),
            created_at: summary.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            fact_check: FactCheckEntry {
                source_url: fact_check.source_url,
                is_verified: fact_check.is_verified,
            },
            region_name: region.name.clone(),
        });
    }

    Ok(Json(entries))
}
