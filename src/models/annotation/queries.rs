use std::collections::HashMap;

use rusqlite::{params, Connection};

use crate::errors::AppError;
use crate::models::slide;

use super::types::*;

/// Replace the whole annotation set of a slide. Delete-then-insert, never a
/// merge; a slide has at most one annotation set. The presentation id is
/// taken from the slide row itself, so an annotation can never reference a
/// different presentation than its slide.
pub fn replace_for_slide(
    conn: &mut Connection,
    slide_id: &str,
    pairs: &[AnnotationPair],
) -> Result<(), AppError> {
    let meta = slide::find_meta(conn, slide_id)?.ok_or(AppError::NotFound)?;

    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM annotations WHERE slide_id = ?1",
        params![slide_id],
    )?;
    for (position, pair) in pairs.iter().enumerate() {
        tx.execute(
            "INSERT INTO annotations (slide_id, presentation_id, position, key, value) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                slide_id,
                meta.presentation_id,
                position as i64,
                pair.key,
                pair.value
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Ordered annotation pairs for a single slide.
pub fn find_for_slide(conn: &Connection, slide_id: &str) -> Result<Vec<AnnotationPair>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT key, value FROM annotations WHERE slide_id = ?1 ORDER BY position",
    )?;
    let pairs = stmt
        .query_map(params![slide_id], |row| {
            Ok(AnnotationPair {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pairs)
}

/// Map of slide id -> ordered pairs for every annotated slide of a
/// presentation. Slides without annotations are absent.
pub fn map_for_presentation(
    conn: &Connection,
    presentation_id: &str,
) -> Result<HashMap<String, Vec<AnnotationPair>>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT slide_id, key, value FROM annotations \
         WHERE presentation_id = ?1 ORDER BY slide_id, position",
    )?;
    let mut map: HashMap<String, Vec<AnnotationPair>> = HashMap::new();
    let rows = stmt.query_map(params![presentation_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            AnnotationPair {
                key: row.get(1)?,
                value: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (slide_id, pair) = row?;
        map.entry(slide_id).or_default().push(pair);
    }
    Ok(map)
}
