use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::AppError;

use super::types::*;

/// Create a presentation record. Created once per upload, before any slide.
pub fn create(conn: &Connection, id: &str, name: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO presentations (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Presentation>, AppError> {
    let row = conn
        .query_row(
            "SELECT id, name, submitted, created_at FROM presentations WHERE id = ?1",
            params![id],
            |row| {
                Ok(Presentation {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    submitted: row.get::<_, i64>(2)? != 0,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Display name only. Used to enrich mirror writes.
pub fn find_name(conn: &Connection, id: &str) -> Result<Option<String>, AppError> {
    let name = conn
        .query_row(
            "SELECT name FROM presentations WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

pub fn find_all(conn: &Connection) -> Result<Vec<PresentationListItem>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.submitted, p.created_at, COUNT(s.id) \
         FROM presentations p \
         LEFT JOIN slides s ON s.presentation_id = p.id \
         GROUP BY p.id \
         ORDER BY p.created_at DESC, p.id",
    )?;
    let items = stmt
        .query_map([], |row| {
            Ok(PresentationListItem {
                id: row.get(0)?,
                name: row.get(1)?,
                submitted: row.get::<_, i64>(2)? != 0,
                created_at: row.get(3)?,
                slide_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Flip the submitted flag. The only mutation a presentation ever sees.
pub fn mark_submitted(conn: &Connection, id: &str) -> Result<(), AppError> {
    let changed = conn.execute(
        "UPDATE presentations SET submitted = 1 WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
