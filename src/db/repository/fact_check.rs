use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::{Document, FactCheck};

/// Fetch the fact check for a summary, creating one from the owning
/// document's verification state when absent.
pub fn get_or_create_fact_check(
    conn: &Connection,
    summary_id: &Uuid,
    source_url: &str,
    is_verified: bool,
) -> Result<FactCheck, DatabaseError> {
    if let Some(existing) = get_fact_check_for_summary(conn, summary_id)? {
        return Ok(existing);
    }

    let fact_check = FactCheck::new(*summary_id, source_url.to_string(), is_verified);
    conn.execute(
        "INSERT INTO fact_checks (id, summary_id, source_url, is_verified, checked_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fact_check.id.to_string(),
            fact_check.summary_id.to_string(),
            fact_check.source_url,
            fact_check.is_verified as i32,
            format_timestamp(fact_check.checked_at),
        ],
    )?;
    Ok(fact_check)
}

pub fn get_fact_check_for_summary(
    conn: &Connection,
    summary_id: &Uuid,
) -> Result<Option<FactCheck>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, summary_id, source_url, is_verified, checked_at
         FROM fact_checks WHERE summary_id = ?1
         ORDER BY checked_at ASC LIMIT 1",
        params![summary_id.to_string()],
        |row| {
            Ok(FactCheckRow {
                id: row.get(0)?,
                summary_id: row.get(1)?,
                source_url: row.get(2)?,
                is_verified: row.get(3)?,
                checked_at: row.get(4)?,
            })
        },
    );

    match result {
        Ok(row) => Ok(Some(fact_check_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Propagate a document's verification state to the fact checks of all
/// its summaries, creating missing ones. Returns how many fact checks
/// were touched.
pub fn sync_document_fact_checks(
    conn: &Connection,
    document: &Document,
) -> Result<u32, DatabaseError> {
    let source_url = document.fact_check_source_url();
    let now = format_timestamp(chrono::Utc::now().naive_utc());

    let mut stmt =
        conn.prepare("SELECT id FROM summaries WHERE document_id = ?1")?;
    let summary_ids: Vec<String> = stmt
        .query_map(params![document.id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    let mut synced = 0u32;
    for summary_id in &summary_ids {
        let id = Uuid::parse_str(summary_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
        get_or_create_fact_check(conn, &id, &source_url, document.verified)?;
        conn.execute(
            "UPDATE fact_checks SET source_url = ?2, is_verified = ?3, checked_at = ?4
             WHERE summary_id = ?1",
            params![summary_id, source_url, document.verified as i32, now],
        )?;
        synced += 1;
    }

    tracing::debug!(
        document_id = %document.id,
        fact_checks = synced,
        verified = document.verified,
        "Synced fact checks from document verification state"
    );
    Ok(synced)
}

struct FactCheckRow {
    id: String,
    summary_id: String,
    source_url: String,
    is_verified: i32,
    checked_at: String,
}

fn fact_check_from_row(row: FactCheckRow) -> Result<FactCheck, DatabaseError> {
    Ok(FactCheck {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        summary_id: Uuid::parse_str(&row.summary_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        source_url: row.source_url,
        is_verified: row.is_verified != 0,
        checked_at: parse_timestamp(&row.checked_at),
    })
}
