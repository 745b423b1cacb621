use serde::Serialize;

/// Presentation as shown in the upload-page list.
#[derive(Debug, Clone, Serialize)]
pub struct PresentationListItem {
    pub id: String,
    pub name: String,
    pub submitted: bool,
    pub created_at: String,
    pub slide_count: i64,
}

/// Full presentation record.
#[derive(Debug, Clone, Serialize)]
pub struct Presentation {
    pub id: String,
    pub name: String,
    pub submitted: bool,
    pub created_at: String,
}
