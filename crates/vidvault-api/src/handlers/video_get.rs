use crate::auth::AuthUser;
use crate::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use vidvault_core::{AppError, VideoRecord};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

#[tracing::instrument(
    skip(state),
    fields(user_id = %auth.user_id, video_id = %id, operation = "get_video")
)]
pub async fn get_video(
    auth: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<VideoRecord>, HttpAppError> {
    let id = Uuid::parse_str(&id)?;
    let video = state
        .videos
        .get_video(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    if !video.is_owned_by(auth.user_id) {
        return Err(AppError::Forbidden("You are not the owner of this video".to_string()).into());
    }

    let video = state.resolver.resolve_record(video).await?;
    Ok(Json(video))
}

#[tracing::instrument(
    skip(state, params),
    fields(user_id = %auth.user_id, limit = params.limit, offset = params.offset, operation = "list_videos")
)]
pub async fn list_videos(
    auth: AuthUser,
    Query(params): Query<ListQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoRecord>>, HttpAppError> {
    let limit = params.limit.clamp(1, MAX_LIST_LIMIT);
    let offset = params.offset.max(0);

    let videos = state
        .videos
        .list_videos_for_user(auth.user_id, limit, offset)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list videos");
            HttpAppError::from(e)
        })?;

    let mut resolved = Vec::with_capacity(videos.len());
    for video in videos {
        resolved.push(state.resolver.resolve_record(video).await?);
    }

    Ok(Json(resolved))
}
