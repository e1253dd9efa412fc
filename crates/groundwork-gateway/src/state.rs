use std::sync::Arc;

use groundwork_config::AppConfig;
use sqlx::PgPool;

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub config: AppConfig,
    /// Absent when the database was unreachable at boot; no skeleton route
    /// requires it.
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Option<PgPool>) -> Self {
        Self { config, db }
    }
}

pub type SharedState = Arc<AppState>;
