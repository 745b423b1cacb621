use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::AppError;

use super::types::*;

/// Insert one slide. Slides are created exactly once during processing and
/// never mutated; the UNIQUE(presentation_id, seq) constraint rejects a
/// second write for the same position.
pub fn insert(
    conn: &Connection,
    id: &str,
    presentation_id: &str,
    seq: u32,
    image: &[u8],
) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO slides (id, presentation_id, seq, image) VALUES (?1, ?2, ?3, ?4)",
        params![id, presentation_id, seq, image],
    )?;
    Ok(())
}

pub fn find_meta(conn: &Connection, id: &str) -> Result<Option<SlideMeta>, AppError> {
    let row = conn
        .query_row(
            "SELECT id, presentation_id, seq FROM slides WHERE id = ?1",
            params![id],
            |row| {
                Ok(SlideMeta {
                    id: row.get(0)?,
                    presentation_id: row.get(1)?,
                    seq: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Slides of a presentation in sequence order, metadata only.
pub fn find_for_presentation(
    conn: &Connection,
    presentation_id: &str,
) -> Result<Vec<SlideMeta>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, presentation_id, seq FROM slides WHERE presentation_id = ?1 ORDER BY seq",
    )?;
    let items = stmt
        .query_map(params![presentation_id], |row| {
            Ok(SlideMeta {
                id: row.get(0)?,
                presentation_id: row.get(1)?,
                seq: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Raw image bytes for serving. The content type is sniffed from the
/// signature at serving time, not stored.
pub fn get_image(conn: &Connection, id: &str) -> Result<Option<Vec<u8>>, AppError> {
    let bytes = conn
        .query_row(
            "SELECT image FROM slides WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(bytes)
}

/// Remove every slide of a presentation. Annotations cascade. Used by the
/// fallback extractor to discard partial progress before backfilling
/// placeholders.
pub fn delete_for_presentation(conn: &Connection, presentation_id: &str) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM slides WHERE presentation_id = ?1",
        params![presentation_id],
    )?;
    Ok(())
}
