//! Health check handler.

use axum::{http::StatusCode, response::IntoResponse, Json};

/// Liveness probe - the process is up and serving.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
