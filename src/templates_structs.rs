// Template context structures for Askama templates.

use askama::Template;

use crate::models::presentation::{Presentation, PresentationListItem};
use crate::models::slide::SlideMeta;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub presentations: Vec<PresentationListItem>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "review.html")]
pub struct ReviewTemplate {
    pub presentation: Presentation,
    pub slides: Vec<SlideMeta>,
}
