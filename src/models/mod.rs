pub mod annotation;
pub mod presentation;
pub mod slide;
