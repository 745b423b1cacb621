pub mod db;
pub mod errors;
pub mod handlers;
pub mod mirror;
pub mod models;
pub mod pipeline;
pub mod templates_structs;

/// Shared application state: primary store pool plus the inspection
/// mirror's pool.
#[derive(Clone)]
pub struct AppState {
    pub pool: db::DbPool,
    pub mirror: db::DbPool,
}
