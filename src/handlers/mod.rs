pub mod presentation_handlers;
pub mod slide_handlers;
