//! Serves objects of the local storage backend behind signed, expiring links.

use crate::error::{storage_error_to_app, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use vidvault_core::AppError;
use vidvault_storage::StorageError;

#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    pub expires: u64,
    pub signature: String,
}

fn content_type_for(key: &str) -> &'static str {
    if key.to_ascii_lowercase().ends_with(".mp4") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}

/// Stream `bucket/key` to the caller. No auth; the signature proves the link was issued by
/// this service and has not expired.
#[tracing::instrument(skip_all, fields(bucket = %bucket, key = %key, operation = "get_asset"))]
pub async fn get_asset(
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<AssetQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let signer = state
        .asset_signer
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Asset route not enabled".to_string()))?;

    signer
        .verify(&bucket, &key, query.expires, &query.signature)
        .map_err(|e| match e {
            StorageError::InvalidKey(_) => {
                AppError::Forbidden("Invalid asset signature".to_string())
            }
            other => storage_error_to_app(other),
        })?;

    let stream = state.storage.download_stream(&bucket, &key).await?;
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&key))
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
