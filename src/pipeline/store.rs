//! Persist-slide interface. The pipeline writes every produced image
//! through this trait; the production implementation writes to the primary
//! store and, best-effort, to the inspection mirror.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rusqlite::Connection;

use crate::errors::AppError;
use crate::models::{presentation, slide};
use crate::mirror;

/// Result of one persist call. `mirrored` is false when the mirror write
/// failed or no mirror is attached; the primary write has still succeeded
/// and the stores may diverge from here on.
#[derive(Debug, Clone, Copy)]
pub struct PersistOutcome {
    pub mirrored: bool,
}

pub trait SlideStore {
    /// Durably store one slide image. Callable once per
    /// (presentation, sequence) pair.
    fn persist_slide(
        &self,
        presentation_id: &str,
        seq: u32,
        slide_id: &str,
        image_base64: &str,
    ) -> Result<PersistOutcome, AppError>;

    /// Remove every slide already persisted for a presentation.
    fn discard_slides(&self, presentation_id: &str) -> Result<(), AppError>;
}

/// Primary + mirror writer. The mirror connection is optional; its absence
/// or failure downgrades the outcome, never the primary write.
pub struct DualStore<'a> {
    primary: &'a Connection,
    mirror: Option<&'a Connection>,
}

impl<'a> DualStore<'a> {
    pub fn new(primary: &'a Connection, mirror: Option<&'a Connection>) -> Self {
        Self { primary, mirror }
    }
}

impl SlideStore for DualStore<'_> {
    fn persist_slide(
        &self,
        presentation_id: &str,
        seq: u32,
        slide_id: &str,
        image_base64: &str,
    ) -> Result<PersistOutcome, AppError> {
        let bytes = STANDARD
            .decode(image_base64)
            .map_err(|e| AppError::Pipeline(format!("invalid slide image encoding: {e}")))?;
        slide::insert(self.primary, slide_id, presentation_id, seq, &bytes)?;

        let mut mirrored = false;
        if let Some(mirror_conn) = self.mirror {
            let name = presentation::find_name(self.primary, presentation_id)
                .ok()
                .flatten()
                .unwrap_or_default();
            match mirror::record_slide(
                mirror_conn,
                slide_id,
                presentation_id,
                &name,
                seq,
                image_base64,
            ) {
                Ok(()) => mirrored = true,
                Err(e) => {
                    log::warn!("mirror write failed for slide {seq} of {presentation_id}: {e}");
                }
            }
        }
        Ok(PersistOutcome { mirrored })
    }

    fn discard_slides(&self, presentation_id: &str) -> Result<(), AppError> {
        slide::delete_for_presentation(self.primary, presentation_id)?;
        if let Some(mirror_conn) = self.mirror {
            if let Err(e) = mirror::discard_slides(mirror_conn, presentation_id) {
                log::warn!("mirror discard failed for {presentation_id}: {e}");
            }
        }
        Ok(())
    }
}
