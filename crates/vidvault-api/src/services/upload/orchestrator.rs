//! Video upload service
//!
//! Runs one upload through: authenticate → authorize → stage → probe → rewrite → key + upload
//! → update record. Every stage either advances or fails the whole request; the local files
//! are always removed. An object is deleted again only when the record is known not to
//! reference it.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use uuid::Uuid;
use vidvault_core::{AppError, Authenticator, ReferenceMode, StorageReference, VideoRecord};
use vidvault_db::VideoStore;
use vidvault_processing::{ContainerRewriter, MediaProber};
use vidvault_storage::{derive_key, extension_for_content_type, Storage};

use super::config::UploadConfig;
use super::staging::{content_type_essence, StagedUpload};
use crate::constants::ACCEPTED_CONTENT_TYPE;

/// Pipeline position, attached to log lines as the `stage` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Authenticating,
    Authorizing,
    Staging,
    Probing,
    Rewriting,
    KeyingAndUploading,
    RecordUpdating,
    Done,
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadStage::Authenticating => "authenticating",
            UploadStage::Authorizing => "authorizing",
            UploadStage::Staging => "staging",
            UploadStage::Probing => "probing",
            UploadStage::Rewriting => "rewriting",
            UploadStage::KeyingAndUploading => "keying_and_uploading",
            UploadStage::RecordUpdating => "record_updating",
            UploadStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Video upload orchestrator
///
/// Holds only shared, read-only collaborators; per-request state lives on the stack of
/// [`UploadOrchestrator::ingest`], so concurrent uploads never see each other's files.
pub struct UploadOrchestrator {
    authenticator: Arc<dyn Authenticator>,
    videos: Arc<dyn VideoStore>,
    prober: Arc<dyn MediaProber>,
    rewriter: Arc<dyn ContainerRewriter>,
    storage: Arc<dyn Storage>,
    config: UploadConfig,
}

impl UploadOrchestrator {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        videos: Arc<dyn VideoStore>,
        prober: Arc<dyn MediaProber>,
        rewriter: Arc<dyn ContainerRewriter>,
        storage: Arc<dyn Storage>,
        config: UploadConfig,
    ) -> Self {
        Self {
            authenticator,
            videos,
            prober,
            rewriter,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Resolve the caller and check they own `video_id`.
    ///
    /// Runs before the request body is read, so a rejected caller never causes a temp file.
    pub async fn authorize(&self, token: &str, video_id: Uuid) -> Result<VideoRecord, AppError> {
        log_stage(UploadStage::Authenticating, video_id);
        let user_id = self.authenticator.authenticate(token)?;

        log_stage(UploadStage::Authorizing, video_id);
        let video = self
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        if !video.is_owned_by(user_id) {
            tracing::warn!(
                video_id = %video_id,
                user_id = %user_id,
                "Upload rejected: caller does not own video"
            );
            return Err(AppError::Forbidden(
                "You are not the owner of this video".to_string(),
            ));
        }

        Ok(video)
    }

    /// Stage, process and store `body` for an already authorized `video`, then point the
    /// record at the stored object. Returns the record as persisted.
    pub async fn ingest<R>(
        &self,
        video: VideoRecord,
        content_type: &str,
        body: &mut R,
    ) -> Result<VideoRecord, AppError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let video_id = video.id;
        let media_type = content_type_essence(content_type);
        if media_type != ACCEPTED_CONTENT_TYPE {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported content type '{}', expected {}",
                media_type, ACCEPTED_CONTENT_TYPE
            )));
        }

        log_stage(UploadStage::Staging, video_id);
        let staged =
            StagedUpload::from_reader(&self.config.staging_dir, body, self.config.max_upload_bytes)
                .await?;
        tracing::debug!(video_id = %video_id, size_bytes = staged.size(), "Upload staged");

        let result = self.process_staged(video, &media_type, &staged).await;
        staged.cleanup();
        result
    }

    async fn process_staged(
        &self,
        mut video: VideoRecord,
        media_type: &str,
        staged: &StagedUpload,
    ) -> Result<VideoRecord, AppError> {
        let video_id = video.id;

        log_stage(UploadStage::Probing, video_id);
        let classification = self
            .with_deadline("probe", self.prober.probe(staged.path()))
            .await?
            .map_err(|e| AppError::MediaProcessing(format!("Failed to probe video: {}", e)))?;
        tracing::info!(
            video_id = %video_id,
            classification = classification.as_str(),
            "Video classified"
        );

        log_stage(UploadStage::Rewriting, video_id);
        let processed = self
            .with_deadline("rewrite", self.rewriter.rewrite(staged.path()))
            .await?
            .map_err(|e| AppError::MediaProcessing(format!("Failed to process video: {}", e)))?;

        log_stage(UploadStage::KeyingAndUploading, video_id);
        let key = derive_key(classification, extension_for_content_type(media_type));
        let bucket = self.config.bucket.as_str();

        let file = tokio::fs::File::open(&processed)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open processed video: {}", e)))?;
        let size_bytes = self
            .with_deadline(
                "upload",
                self.storage
                    .upload_stream(bucket, &key, media_type, Box::pin(file)),
            )
            .await?
            .map_err(|e| {
                tracing::error!(error = %e, video_id = %video_id, "Failed to upload to storage");
                AppError::S3(format!("Failed to upload video: {}", e))
            })?;

        tracing::info!(
            video_id = %video_id,
            bucket = %bucket,
            key = %key,
            size_bytes = size_bytes,
            "Upload to storage successful"
        );

        log_stage(UploadStage::RecordUpdating, video_id);
        let reference = self.reference_for(bucket, &key);
        video.video_url = Some(reference.clone());
        let updated = match self
            .with_deadline("record update", self.videos.update_video(&video))
            .await
            .and_then(|r| r)
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(error = %e, video_id = %video_id, "Failed to update video record");
                self.settle_failed_update(video_id, &reference, bucket, &key).await;
                return Err(match e {
                    AppError::Timeout(msg) => AppError::Timeout(msg),
                    other => {
                        AppError::Internal(format!("Failed to update video record: {}", other))
                    }
                });
            }
        };

        log_stage(UploadStage::Done, video_id);
        Ok(updated)
    }

    /// Value persisted in `video_url` for a freshly stored object.
    fn reference_for(&self, bucket: &str, key: &str) -> String {
        match (self.config.reference_mode, self.config.public_base_url.as_deref()) {
            (ReferenceMode::Public, Some(base)) => {
                format!("{}/{}", base.trim_end_matches('/'), key)
            }
            _ => StorageReference::new(bucket, key).encode(),
        }
    }

    /// Decide what happens to the stored object after the record update reported failure.
    ///
    /// A timed-out or dropped update may still have committed, so the record is read back
    /// first. The object is deleted only when the record is known not to reference it.
    async fn settle_failed_update(
        &self,
        video_id: Uuid,
        reference: &str,
        bucket: &str,
        key: &str,
    ) {
        let current = self
            .with_deadline("record read-back", self.videos.get_video(video_id))
            .await
            .and_then(|r| r);

        match current {
            Ok(Some(record)) if record.video_url.as_deref() == Some(reference) => {
                tracing::warn!(
                    video_id = %video_id,
                    bucket = %bucket,
                    key = %key,
                    "Record update reported failure but committed, keeping uploaded object"
                );
            }
            Ok(_) => self.discard_object(bucket, key, video_id).await,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    video_id = %video_id,
                    bucket = %bucket,
                    key = %key,
                    "Could not read back video record, keeping uploaded object as a possible orphan"
                );
            }
        }
    }

    /// Delete an object the record does not reference.
    async fn discard_object(&self, bucket: &str, key: &str, video_id: Uuid) {
        if let Err(e) = self.storage.delete(bucket, key).await {
            tracing::error!(
                error = %e,
                video_id = %video_id,
                bucket = %bucket,
                key = %key,
                "Failed to delete uploaded object after record update failure, object is orphaned"
            );
        } else {
            tracing::info!(
                video_id = %video_id,
                bucket = %bucket,
                key = %key,
                "Deleted uploaded object after record update failure"
            );
        }
    }

    async fn with_deadline<F, T>(&self, operation: &str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = T>,
    {
        let limit: Duration = self.config.external_call_timeout;
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            AppError::Timeout(format!(
                "{} did not finish within {}s",
                operation,
                limit.as_secs()
            ))
        })
    }
}

fn log_stage(stage: UploadStage, video_id: Uuid) {
    tracing::debug!(stage = %stage, video_id = %video_id, "Upload stage");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(UploadStage::KeyingAndUploading.to_string(), "keying_and_uploading");
        assert_eq!(UploadStage::RecordUpdating.to_string(), "record_updating");
        assert_eq!(UploadStage::Done.to_string(), "done");
    }
}
