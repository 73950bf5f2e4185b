//! Lazy resolution of stored video references into fetchable URLs.

use std::sync::Arc;
use std::time::Duration;

use vidvault_core::{StorageReference, VideoRecord};

use crate::{Storage, StorageResult};

/// Turns a record's stored `video_url` into something a client can fetch.
///
/// A `bucket,key` reference becomes a fresh presigned GET URL on every call. Any other value is
/// returned unchanged. Nothing is cached and nothing is written back.
#[derive(Clone)]
pub struct ReferenceResolver {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl ReferenceResolver {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn resolve(&self, stored: &str) -> StorageResult<String> {
        match StorageReference::parse(stored) {
            Some(reference) => {
                self.storage
                    .get_presigned_url(&reference.bucket, &reference.key, self.ttl)
                    .await
            }
            None => Ok(stored.to_string()),
        }
    }

    /// Resolve `video_url` in place. Records without a video are returned as-is.
    pub async fn resolve_record(&self, mut record: VideoRecord) -> StorageResult<VideoRecord> {
        if let Some(stored) = record.video_url.take() {
            record.video_url = Some(self.resolve(&stored).await?);
        }
        Ok(record)
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use crate::{LocalStorage, UrlSigner};
    use chrono::Utc;
    use tempfile::tempdir;
    use uuid::Uuid;

    async fn resolver(dir: &std::path::Path) -> ReferenceResolver {
        let storage = LocalStorage::new(
            dir,
            "http://localhost:8091/assets".to_string(),
            UrlSigner::new("test-secret").unwrap(),
        )
        .await
        .unwrap();
        ReferenceResolver::new(Arc::new(storage), Duration::from_secs(3600))
    }

    fn record(video_url: Option<&str>) -> VideoRecord {
        VideoRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "clip".to_string(),
            description: String::new(),
            thumbnail_url: None,
            video_url: video_url.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reference_is_presigned() {
        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path()).await;

        let url = resolver.resolve("videos,portrait/abc.mp4").await.unwrap();
        assert!(url.starts_with("http://localhost:8091/assets/videos/portrait/abc.mp4?expires="));
        assert!(url.contains("&signature="));
    }

    #[tokio::test]
    async fn test_plain_url_passes_through() {
        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path()).await;

        let direct = "https://cdn.example.com/portrait/abc.mp4";
        assert_eq!(resolver.resolve(direct).await.unwrap(), direct);
        assert_eq!(resolver.resolve("a,b,c").await.unwrap(), "a,b,c");
    }

    #[tokio::test]
    async fn test_resolve_record() {
        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path()).await;

        let resolved = resolver
            .resolve_record(record(Some("videos,landscape/x.mp4")))
            .await
            .unwrap();
        assert!(resolved
            .video_url
            .unwrap()
            .contains("/assets/videos/landscape/x.mp4?"));

        let empty = resolver.resolve_record(record(None)).await.unwrap();
        assert!(empty.video_url.is_none());
    }
}
