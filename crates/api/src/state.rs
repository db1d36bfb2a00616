use std::sync::Arc;

use vibe_engine::VibeEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the engine is a bundle of `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub engine: VibeEngine,
    pub config: Arc<ServerConfig>,
    /// Present when running on Postgres; used by the health check.
    pub pool: Option<vibe_db::DbPool>,
}
