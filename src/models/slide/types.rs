use serde::Serialize;

/// Slide metadata without the image payload.
#[derive(Debug, Clone, Serialize)]
pub struct SlideMeta {
    pub id: String,
    pub presentation_id: String,
    pub seq: u32,
}
