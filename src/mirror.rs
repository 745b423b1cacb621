//! Secondary SQLite mirror kept alongside the primary store for ad-hoc
//! inspection. One denormalized row per slide, image kept as base64 text
//! so rows are readable straight out of the sqlite3 shell.
//!
//! Mirror writes are best-effort: a failure is logged and reported through
//! `PersistOutcome::mirrored`, never rolled back against the primary. The
//! two stores are allowed to diverge.

use rusqlite::{params, Connection};

use crate::db::DbPool;

pub const MIRROR_MIGRATIONS: &str = "\
CREATE TABLE IF NOT EXISTS slide_mirror (
    slide_id           TEXT PRIMARY KEY,
    presentation_id    TEXT NOT NULL,
    presentation_name  TEXT NOT NULL,
    seq                INTEGER NOT NULL,
    image_base64       TEXT NOT NULL,
    mirrored_at        TEXT NOT NULL
);";

pub fn init_pool(database_url: &str) -> DbPool {
    crate::db::init_pool(database_url)
}

pub fn run_migrations(pool: &DbPool) {
    let conn = pool
        .get()
        .expect("Failed to get mirror connection for migrations");
    conn.execute_batch(MIRROR_MIGRATIONS)
        .expect("Failed to run mirror migrations");
    log::info!("Mirror migrations complete");
}

/// Write one slide row into the mirror. `presentation_name` enriches the
/// row so the mirror is browsable without joining back to the primary.
pub fn record_slide(
    conn: &Connection,
    slide_id: &str,
    presentation_id: &str,
    presentation_name: &str,
    seq: u32,
    image_base64: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO slide_mirror \
         (slide_id, presentation_id, presentation_name, seq, image_base64, mirrored_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            slide_id,
            presentation_id,
            presentation_name,
            seq,
            image_base64,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Drop mirror rows for a presentation. Used when the fallback extractor
/// discards partial progress.
pub fn discard_slides(conn: &Connection, presentation_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM slide_mirror WHERE presentation_id = ?1",
        params![presentation_id],
    )?;
    Ok(())
}
