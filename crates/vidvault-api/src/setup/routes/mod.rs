//! Route configuration and setup

mod health;

use crate::constants::{API_PREFIX, ASSETS_PREFIX, DEFAULT_HTTP_CONCURRENCY_LIMIT};
use crate::handlers::{assets, video_get, video_upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vidvault_core::Config;
use vidvault_infra::{request_id_middleware, security_headers_middleware};

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Server-level concurrency limit; uploads hold a connection for the whole pipeline
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    Ok(router_with_layers(state, cors, http_concurrency_limit))
}

/// The full router with its middleware stack, independent of environment lookups.
pub fn router_with_layers(
    state: Arc<AppState>,
    cors: CorsLayer,
    http_concurrency_limit: usize,
) -> Router<()> {
    // The upload handler enforces its own size cap while staging, so axum's default body
    // limit must not cut the stream first.
    let api_routes = Router::new()
        .route("/videos", get(video_get::list_videos))
        .route("/videos/{video_id}", get(video_get::get_video))
        .route(
            "/videos/{video_id}/upload",
            post(video_upload::upload_video).layer(DefaultBodyLimit::disable()),
        );

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .nest(API_PREFIX, api_routes);

    if state.asset_signer.is_some() {
        app = app.route(
            &format!("{}/{{bucket}}/{{*key}}", ASSETS_PREFIX),
            get(assets::get_asset),
        );
    }

    app.layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state)
}

/// Setup CORS configuration
pub fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any))
}
