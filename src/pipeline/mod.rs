//! Presentation processing pipeline: slide-count detection, the external
//! conversion strategy chain, and the archive-based fallback extractor.
//!
//! One logical thread of control per upload; nothing here runs slides or
//! strategies in parallel, since sequence numbering depends on a fully
//! materialized, sorted file listing.

pub mod convert;
pub mod detect;
pub mod extract;
pub mod render;
pub mod store;
pub mod tool;

use std::fs;
use std::path::Path;

use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::presentation;

use store::DualStore;
use tool::ToolRunner;

/// Process one uploaded presentation: create the record, try the external
/// conversion chain, fall back to archive extraction. The temporary upload
/// file is removed on every exit path; errors escape only after cleanup.
pub fn process_presentation(
    pool: &DbPool,
    mirror: &DbPool,
    original_filename: &str,
    temp_path: &Path,
    runner: &dyn ToolRunner,
) -> Result<String, AppError> {
    let result = run(pool, mirror, original_filename, temp_path, runner);
    if let Err(e) = fs::remove_file(temp_path) {
        log::warn!("could not remove upload {}: {e}", temp_path.display());
    }
    result
}

fn run(
    pool: &DbPool,
    mirror: &DbPool,
    original_filename: &str,
    temp_path: &Path,
    runner: &dyn ToolRunner,
) -> Result<String, AppError> {
    let conn = pool.get()?;
    // A mirror outage must not block uploads.
    let mirror_conn = match mirror.get() {
        Ok(conn) => Some(conn),
        Err(e) => {
            log::warn!("mirror unavailable: {e}");
            None
        }
    };

    let presentation_id = Uuid::new_v4().to_string();
    let display_name = Path::new(original_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_filename)
        .to_string();
    presentation::create(&conn, &presentation_id, &display_name)?;

    let detected = detect::detect_slide_count(temp_path);
    log::info!("processing '{display_name}' ({presentation_id}), detected {detected} slides");

    let store = DualStore::new(&conn, mirror_conn.as_deref());
    let converted = convert::run_chain(temp_path, &store, &presentation_id, runner)?;
    let produced = if converted > 0 {
        converted
    } else {
        extract::extract_fallback(temp_path, &store, &presentation_id, detected)?
    };

    if produced == 0 {
        return Err(AppError::Pipeline(
            "no slides could be extracted from the presentation".to_string(),
        ));
    }
    log::info!("presentation {presentation_id}: {produced} slides persisted");
    Ok(presentation_id)
}
