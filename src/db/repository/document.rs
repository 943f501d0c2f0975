use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::enums::ProcessingStatus;
use crate::models::Document;

const DOCUMENT_COLUMNS: &str = "id, title, pdf_url, local_file, verification_url, verified, \
     region_id, uploaded_at, processing_status";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    // The schema CHECK also enforces this; validating here gives a
    // clearer error than a raw constraint failure.
    if doc.pdf_url.is_some() == doc.local_file.is_some() {
        return Err(DatabaseError::ConstraintViolation(
            "document must have exactly one of pdf_url or local_file".into(),
        ));
    }

    conn.execute(
        "INSERT INTO documents (id, title, pdf_url, local_file, verification_url, verified,
         region_id, uploaded_at, processing_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            doc.id.to_string(),
            doc.title,
            doc.pdf_url,
            doc.local_file,
            doc.verification_url,
            doc.verified as i32,
            doc.region_id.to_string(),
            format_timestamp(doc.uploaded_at),
            doc.processing_status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], map_document_row);

    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All documents in a region, newest first.
pub fn list_documents_by_region(
    conn: &Connection,
    region_id: &Uuid,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE region_id = ?1 ORDER BY uploaded_at DESC"
    ))?;

    let rows = stmt.query_map(params![region_id.to_string()], map_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

/// Update only the processing status of a document.
///
/// Deliberately a targeted single-column UPDATE outside the document
/// write path that callers pair with trigger enqueueing; completing a
/// document must not re-trigger its own processing.
pub fn update_processing_status(
    conn: &Connection,
    document_id: &Uuid,
    status: ProcessingStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET processing_status = ?2 WHERE id = ?1",
        params![document_id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: document_id.to_string(),
        });
    }
    Ok(())
}

/// Update the verification flag and URL of a document.
pub fn set_document_verification(
    conn: &Connection,
    document_id: &Uuid,
    verified: bool,
    verification_url: Option<&str>,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET verified = ?2, verification_url = COALESCE(?3, verification_url)
         WHERE id = ?1",
        params![document_id.to_string(), verified as i32, verification_url],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: document_id.to_string(),
        });
    }
    Ok(())
}

/// Documents the sweep should re-enqueue: still flagged unprocessed, or
/// carrying no summaries at all (a lost or dropped trigger).
pub fn find_stuck_documents(
    conn: &Connection,
    limit: u32,
) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id FROM documents d
         LEFT JOIN summaries s ON s.document_id = d.id
         GROUP BY d.id
         HAVING d.processing_status = 'unprocessed' OR COUNT(s.id) = 0
         ORDER BY d.uploaded_at ASC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        let id = row?;
        ids.push(
            Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        );
    }
    Ok(ids)
}

// Internal row type for Document mapping
struct DocumentRow {
    id: String,
    title: String,
    pdf_url: Option<String>,
    local_file: Option<String>,
    verification_url: Option<String>,
    verified: i32,
    region_id: String,
    uploaded_at: String,
    processing_status: String,
}

fn map_document_row(row: &rusqlite::Row<'_>) -> Result<DocumentRow, rusqlite::Error> {
    Ok(DocumentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        pdf_url: row.get(2)?,
        local_file: row.get(3)?,
        verification_url: row.get(4)?,
        verified: row.get(5)?,
        region_id: row.get(6)?,
        uploaded_at: row.get(7)?,
        processing_status: row.get(8)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        title: row.title,
        pdf_url: row.pdf_url,
        local_file: row.local_file,
        verification_url: row.verification_url,
        verified: row.verified != 0,
        region_id: Uuid::parse_str(&row.region_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        uploaded_at: parse_timestamp(&row.uploaded_at),
        processing_status: ProcessingStatus::from_str(&row.processing_status)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::region::insert_region;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Region;

    fn setup() -> (Connection, Region) {
        let conn = open_memory_database().unwrap();
        let region = Region::new("Uganda", "UG");
        insert_region(&conn, &region).unwrap();
        (conn, region)
    }

    #[test]
    fn insert_and_get_round_trips() {
        let (conn, region) = setup();
        let doc = Document::new(
            "Uganda Budget 2025",
            Some("https://example.com/budget.pdf".into()),
            None,
            region.id,
        );
        insert_document(&conn, &doc).unwrap();

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Uganda Budget 2025");
        assert_eq!(loaded.pdf_url.as_deref(), Some("https://example.com/budget.pdf"));
        assert!(loaded.local_file.is_none());
        assert_eq!(loaded.processing_status, ProcessingStatus::Unprocessed);
        assert_eq!(loaded.region_id, region.id);
    }

    #[test]
    fn missing_document_returns_none() {
        let (conn, _region) = setup();
        assert!(get_document(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn rejects_document_with_both_sources() {
        let (conn, region) = setup();
        let mut doc = Document::new("Budget", Some("https://x/y.pdf".into()), None, region.id);
        doc.local_file = Some("/tmp/y.pdf".into());

        let result = insert_document(&conn, &doc);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn rejects_document_with_no_source() {
        let (conn, region) = setup();
        let doc = Document::new("Budget", None, None, region.id);
        let result = insert_document(&conn, &doc);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn status_update_round_trips() {
        let (conn, region) = setup();
        let doc = Document::new("Budget", Some("https://x/y.pdf".into()), None, region.id);
        insert_document(&conn, &doc).unwrap();

        update_processing_status(&conn, &doc.id, ProcessingStatus::ProcessedWithError).unwrap();
        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.processing_status, ProcessingStatus::ProcessedWithError);
    }

    #[test]
    fn status_update_on_missing_document_errors() {
        let (conn, _region) = setup();
        let result = update_processing_status(&conn, &Uuid::new_v4(), ProcessingStatus::Processed);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn verification_update_preserves_url_when_absent() {
        let (conn, region) = setup();
        let mut doc = Document::new("Budget", Some("https://x/y.pdf".into()), None, region.id);
        doc.verification_url = Some("https://audit.example.com".into());
        insert_document(&conn, &doc).unwrap();

        set_document_verification(&conn, &doc.id, true, None).unwrap();
        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert!(loaded.verified);
        assert_eq!(loaded.verification_url.as_deref(), Some("https://audit.example.com"));
    }

    #[test]
    fn finds_unprocessed_and_summaryless_documents() {
        let (conn, region) = setup();

        // Unprocessed, no summaries; stuck
        let stuck = Document::new("Stuck", Some("https://x/1.pdf".into()), None, region.id);
        insert_document(&conn, &stuck).unwrap();

        // Processed with a summary; healthy
        let done = Document::new("Done", Some("https://x/2.pdf".into()), None, region.id);
        insert_document(&conn, &done).unwrap();
        conn.execute(
            "INSERT INTO summaries (id, document_id, language, text, created_at)
             VALUES ('s1', ?1, 'en', 'Summary text', '2026-01-01 00:00:00')",
            params![done.id.to_string()],
        )
        .unwrap();
        update_processing_status(&conn, &done.id, ProcessingStatus::Processed).unwrap();

        // Marked processed but has zero summaries; also stuck
        let hollow = Document::new("Hollow", Some("https://x/3.pdf".into()), None, region.id);
        insert_document(&conn, &hollow).unwrap();
        update_processing_status(&conn, &hollow.id, ProcessingStatus::Processed).unwrap();

        let ids = find_stuck_documents(&conn, 10).unwrap();
        assert!(ids.contains(&stuck.id));
        assert!(ids.contains(&hollow.id));
        assert!(!ids.contains(&done.id));
    }

    #[test]
    fn stuck_document_batch_is_limited() {
        let (conn, region) = setup();
        for i in 0..5 {
            let doc = Document::new(
                &format!("Budget {i}"),
                Some(format!("https://x/{i}.pdf")),
                None,
                region.id,
            );
            insert_document(&conn, &doc).unwrap();
        }
        let ids = find_stuck_documents(&conn, 3).unwrap();
        assert_eq!(ids.len(), 3);
    }
}
