//! Route configuration and setup.
//!
//! Upload routes live in [`crate::handlers`]; health checks in [health](health).

mod health;

use crate::api_doc::get_openapi_spec;
use crate::constants::{API_DOCS_UI_PATH, MULTIPART_OVERHEAD_BYTES, OPENAPI_JSON_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use cairn_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = config.base.http_concurrency_limit;
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = upload_routes(state.upload.max_file_size_bytes)
        .merge(health_routes())
        .with_state(state)
        .route(OPENAPI_JSON_PATH, get(|| async { Json(get_openapi_spec()) }))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path(API_DOCS_UI_PATH))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn upload_routes(max_file_size_bytes: u64) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/uploads",
            get(handlers::list::list_uploads).post(handlers::upload::upload_file),
        )
        .layer(DefaultBodyLimit::max(upload_body_limit(max_file_size_bytes)))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Body ceiling for the upload route. The pipeline's own byte counter trips
/// long before this, so oversized files get a `FileTooLarge` response rather
/// than a framework error.
fn upload_body_limit(max_file_size_bytes: u64) -> usize {
    usize::try_from(max_file_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };

    Ok(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_body_limit_leaves_room_for_the_counter() {
        let limit = upload_body_limit(2 * 1024 * 1024);
        assert_eq!(limit, 4 * 1024 * 1024 + MULTIPART_OVERHEAD_BYTES);
        assert_eq!(upload_body_limit(u64::MAX), usize::MAX);
    }
}
