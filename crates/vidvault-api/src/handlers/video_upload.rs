use crate::auth::bearer_token;
use crate::constants::VIDEO_FORM_FIELD;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use uuid::Uuid;
use vidvault_core::{AppError, VideoRecord};

/// Upload the media for an existing video record.
///
/// Checks run cheapest first: id, token, ownership, then the body. The multipart body is only
/// touched once the caller is known to own the record.
#[tracing::instrument(skip_all, fields(video_id = %video_id, operation = "upload_video"))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoRecord>, HttpAppError> {
    let video_id = Uuid::parse_str(&video_id)?;
    let token = bearer_token(&headers)?;
    let video = state.uploads.authorize(token, video_id).await?;

    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(VIDEO_FORM_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let mut body = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));

        let updated = state
            .uploads
            .ingest(video, &content_type, &mut body)
            .await?;

        // The upload is committed at this point, so a link failure must not fail the request
        return match state.resolver.resolve_record(updated.clone()).await {
            Ok(resolved) => Ok(Json(resolved)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    video_id = %video_id,
                    "Failed to resolve video link after upload, returning stored reference"
                );
                Ok(Json(updated))
            }
        };
    }

    Err(AppError::BadRequest(format!("Unable to find '{}' in form", VIDEO_FORM_FIELD)).into())
}
