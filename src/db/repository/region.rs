use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Region;

pub fn insert_region(conn: &Connection, region: &Region) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO regions (id, name, code) VALUES (?1, ?2, ?3)",
        params![region.id.to_string(), region.name, region.code],
    )?;
    Ok(())
}

pub fn get_region(conn: &Connection, id: &Uuid) -> Result<Option<Region>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, name, code FROM regions WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    );

    match result {
        Ok(row) => Ok(Some(region_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_region_by_code(conn: &Connection, code: &str) -> Result<Option<Region>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, name, code FROM regions WHERE code = ?1",
        params![code],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    );

    match result {
        Ok(row) => Ok(Some(region_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Look a region up by code, creating it when absent.
pub fn get_or_create_region(
    conn: &Connection,
    code: &str,
    name: &str,
) -> Result<Region, DatabaseError> {
    if let Some(region) = get_region_by_code(conn, code)? {
        return Ok(region);
    }
    let region = Region::new(name, code);
    insert_region(conn, &region)?;
    Ok(region)
}

fn region_from_row(row: (String, String, String)) -> Result<Region, DatabaseError> {
    Ok(Region {
        id: Uuid::parse_str(&row.0).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.1,
        code: row.2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_get_by_code() {
        let conn = open_memory_database().unwrap();
        let region = Region::new("Uganda", "UG");
        insert_region(&conn, &region).unwrap();

        let found = get_region_by_code(&conn, "UG").unwrap().unwrap();
        assert_eq!(found.id, region.id);
        assert_eq!(found.name, "Uganda");
    }

    #[test]
    fn unknown_code_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_region_by_code(&conn, "ZZ").unwrap().is_none());
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let first = get_or_create_region(&conn, "GH", "Ghana").unwrap();
        let second = get_or_create_region(&conn, "GH", "Ghana").unwrap();
        assert_eq!(first.id, second.id);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM regions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
