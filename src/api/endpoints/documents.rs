//! Document registration and administration endpoints.
//!
//! Creating a document is the trigger event for processing; the
//! handler enqueues explicitly after the insert, there is no hidden
//! save hook.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::enums::ProcessingStatus;
use crate::models::Document;

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub region_code: String,
    pub region_name: Option<String>,
    pub pdf_url: Option<String>,
    pub local_file: Option<String>,
    pub verification_url: Option<String>,
}

#[derive(Serialize)]
pub struct CreateDocumentResponse {
    pub id: String,
    pub processing_status: String,
}

/// `POST /api/documents`: register a document and enqueue processing.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    let has_url = request.pdf_url.as_deref().is_some_and(|u| !u.trim().is_empty());
    let has_file = request
        .local_file
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    if has_url == has_file {
        return Err(ApiError::BadRequest(
            "exactly one of pdf_url or local_file is required".into(),
        ));
    }

    let conn = ctx.open_db()?;

    let region_name = request.region_name.as_deref().unwrap_or(&request.region_code);
    let region = repository::get_or_create_region(&conn, &request.region_code, region_name)?;

    let mut document = Document::new(
        &request.title,
        request.pdf_url.filter(|_| has_url),
        request.local_file.filter(|_| has_file),
        region.id,
    );
    document.verification_url = request.verification_url;
    repository::insert_document(&conn, &document)?;

    // The create event is the processing trigger.
    ctx.trigger.enqueue_document(document.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateDocumentResponse {
            id: document.id.to_string(),
            processing_status: document.processing_status.as_str().to_string(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct VerifyDocumentRequest {
    pub verified: bool,
    pub verification_url: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyDocumentResponse {
    pub id: String,
    pub verified: bool,
    pub fact_checks_synced: u32,
}

/// `POST /api/documents/:id/verify`: update verification state and
/// propagate it to every fact check of every summary of the document.
pub async fn verify(
    State(ctx): State<ApiContext>,
    Path(document_id): Path<String>,
    Json(request): Json<VerifyDocumentRequest>,
) -> Result<Json<VerifyDocumentResponse>, ApiError> {
    let document_id = parse_document_id(&document_id)?;
    let conn = ctx.open_db()?;

    repository::set_document_verification(
        &conn,
        &document_id,
        request.verified,
        request.verification_url.as_deref(),
    )?;

    let document = repository::get_document(&conn, &document_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Document {document_id} not found")))?;
    let synced = repository::sync_document_fact_checks(&conn, &document)?;

    Ok(Json(VerifyDocumentResponse {
        id: document_id.to_string(),
        verified: document.verified,
        fact_checks_synced: synced,
    }))
}

#[derive(Serialize)]
pub struct ReprocessResponse {
    pub id: String,
    pub processing_status: String,
}

/// `POST /api/documents/:id/reprocess`: reset to unprocessed and
/// re-enqueue.
pub async fn reprocess(
    State(ctx): State<ApiContext>,
    Path(document_id): Path<String>,
) -> Result<Json<ReprocessResponse>, ApiError> {
    let document_id = parse_document_id(&document_id)?;
    let conn = ctx.open_db()?;

    repository::update_processing_status(&conn, &document_id, ProcessingStatus::Unprocessed)?;
    ctx.trigger.enqueue_document(document_id);

    Ok(Json(ReprocessResponse {
        id: document_id.to_string(),
        processing_status: ProcessingStatus::Unprocessed.as_str().to_string(),
    }))
}

fn parse_document_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid document id: {raw}")))
}
