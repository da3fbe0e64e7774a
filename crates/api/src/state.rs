use std::sync::Arc;

use crate::config::ServerConfig;
use crate::service::ProjectService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: aoi_db::DbPool,
    /// Server configuration, loaded once at startup.
    pub config: Arc<ServerConfig>,
    /// Project use cases.
    pub projects: Arc<ProjectService>,
}

impl AppState {
    pub fn new(pool: aoi_db::DbPool, config: ServerConfig) -> Self {
        Self {
            projects: Arc::new(ProjectService::new(pool.clone())),
            pool,
            config: Arc::new(config),
        }
    }
}
