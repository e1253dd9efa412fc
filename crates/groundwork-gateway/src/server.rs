use std::sync::Arc;

use groundwork_common::{Error, Result};
use groundwork_config::AppConfig;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// The HTTP server that binds to a port and serves the API skeleton.
pub struct GatewayServer {
    config: AppConfig,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);

        let db = self.init_db_pool().await;

        if let Err(e) = std::fs::create_dir_all(&self.config.gateway.uploads_dir) {
            warn!(
                "failed to create uploads directory {}: {}",
                self.config.gateway.uploads_dir.display(),
                e
            );
        }

        let state = Arc::new(AppState::new(self.config, db));
        let app = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("groundwork gateway listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Gateway(format!("server error: {e}")))?;

        Ok(())
    }

    async fn init_db_pool(&self) -> Option<PgPool> {
        match groundwork_db::pool::connect(&self.config.database).await {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("database unavailable, starting without it: {e}");
                None
            }
        }
    }
}
