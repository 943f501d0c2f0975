use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::enums::Language;
use crate::models::Summary;

const SUMMARY_COLUMNS: &str =
    "id, document_id, language, text, original_text, explanation, created_at";

/// Insert a summary unless one already exists for (document, language).
///
/// Returns whether the row was created. `ON CONFLICT DO NOTHING` makes
/// the schema's UNIQUE constraint the authoritative idempotency guard:
/// a concurrent run that loses the race simply records nothing.
pub fn insert_summary(conn: &Connection, summary: &Summary) -> Result<bool, DatabaseError> {
    let rows = conn.execute(
        "INSERT INTO summaries (id, document_id, language, text, original_text, explanation, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (document_id, language) DO NOTHING",
        params![
            summary.id.to_string(),
            summary.document_id.to_string(),
            summary.language.as_str(),
            summary.text,
            summary.original_text,
            summary.explanation,
            format_timestamp(summary.created_at),
        ],
    )?;
    Ok(rows > 0)
}

pub fn summary_exists(
    conn: &Connection,
    document_id: &Uuid,
    language: Language,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM summaries WHERE document_id = ?1 AND language = ?2",
        params![document_id.to_string(), language.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Attach an explanation to an existing summary.
pub fn update_summary_explanation(
    conn: &Connection,
    summary_id: &Uuid,
    explanation: &str,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE summaries SET explanation = ?2 WHERE id = ?1",
        params![summary_id.to_string(), explanation],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Summary".into(),
            id: summary_id.to_string(),
        });
    }
    Ok(())
}

pub fn get_summary(conn: &Connection, id: &Uuid) -> Result<Option<Summary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM summaries WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], map_summary_row);

    match result {
        Ok(row) => Ok(Some(summary_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// First summary of a document in the given language, oldest first;
/// if duplicates ever exist, the first one wins.
pub fn get_summary_for_document(
    conn: &Connection,
    document_id: &Uuid,
    language: Language,
) -> Result<Option<Summary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM summaries
         WHERE document_id = ?1 AND language = ?2
         ORDER BY created_at ASC LIMIT 1"
    ))?;

    let result = stmt.query_row(
        params![document_id.to_string(), language.as_str()],
        map_summary_row,
    );

    match result {
        Ok(row) => Ok(Some(summary_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All summaries of a document, across languages.
pub fn list_summaries_for_document(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Vec<Summary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM summaries WHERE document_id = ?1 ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map(params![document_id.to_string()], map_summary_row)?;

    let mut summaries = Vec::new();
    for row in rows {
        summaries.push(summary_from_row(row?)?);
    }
    Ok(summaries)
}

// Internal row type for Summary mapping
struct SummaryRow {
    id: String,
    document_id: String,
    language: String,
    text: String,
    original_text: Option<String>,
    explanation: Option<String>,
    created_at: String,
}

fn map_summary_row(row: &rusqlite::Row<'_>) -> Result<SummaryRow, rusqlite::Error> {
    Ok(SummaryRow {
        id: row.get(0)?,
        document_id: row.get(1)?,
        language: row.get(2)?,
        text: row.get(3)?,
        original_text: row.get(4)?,
        explanation: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn summary_from_row(row: SummaryRow) -> Result<Summary, DatabaseError> {
    Ok(Summary {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        document_id: Uuid::parse_str(&row.document_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        language: Language::from_str(&row.language)?,
        text: row.text,
        original_text: row.original_text,
        explanation: row.explanation,
        created_at: parse_timestamp(&row.created_at),
    })
}
