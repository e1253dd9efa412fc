use axum::extract::{DefaultBodyLimit, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route("/api/health", get(health))
        // application routes mount here
        .nest_service(
            "/uploads",
            ServeDir::new(&state.config.gateway.uploads_dir),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.gateway.body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "database": if state.db.is_some() { "connected" } else { "unavailable" },
    }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("resource not found")
}

fn cors_layer(state: &SharedState) -> CorsLayer {
    let frontend_url = state.config.gateway.frontend_url.clone();
    let dev_mode = state.config.environment.is_development();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| {
                origin
                    .to_str()
                    .map(|origin| origin_allowed(origin, &frontend_url, dev_mode))
                    .unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// The configured frontend origin is always allowed; development mode also
/// admits any localhost origin so local tooling on other ports can reach
/// the API.
fn origin_allowed(origin: &str, frontend_url: &str, dev_mode: bool) -> bool {
    origin == frontend_url || (dev_mode && origin.starts_with("http://localhost:"))
}
