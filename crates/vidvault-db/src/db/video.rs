use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidvault_core::{AppError, VideoRecord};

/// Persistence operations the API needs for video records.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Fetch a record by id regardless of owner. Ownership is checked by the caller.
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Persist the mutable fields of `video` and return the stored row.
    ///
    /// Fails with `NotFound` if the record no longer exists.
    async fn update_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError>;

    /// Records owned by `user_id`, newest first.
    async fn list_videos_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoRecord>, AppError>;
}

/// Postgres-backed [`VideoStore`]
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, VideoRecord>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", video_id = %video.id))]
    async fn update_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError> {
        let row = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            UPDATE videos
            SET title = $2,
                description = $3,
                thumbnail_url = $4,
                video_url = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Video {} not found", video.id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_videos_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, VideoRecord>(
            "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
