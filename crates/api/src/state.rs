use std::sync::Arc;

use persona_pipeline::GenerationPipeline;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: persona_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Runs generation jobs submitted over the streaming endpoint.
    pub pipeline: Arc<GenerationPipeline>,
}
