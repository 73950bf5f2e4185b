use crate::traits::{validate_object_path, ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, Attributes, ObjectStore, ObjectStoreExt, Result as ObjectResult};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// S3 storage implementation
///
/// Uploads go through a multipart writer so an object of any size streams through a bounded
/// buffer. References may name buckets other than the default one; those are reached through a
/// client built from the same settings.
#[derive(Clone)]
pub struct S3Storage {
    builder: AmazonS3Builder,
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - Default S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID and friends).
        let mut builder = AmazonS3Builder::from_env().with_region(region.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        Self::from_builder(builder, bucket, region, endpoint_url)
    }

    fn from_builder(
        builder: AmazonS3Builder,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let store = builder
            .clone()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            region = %region,
            endpoint = ?endpoint_url,
            "S3 storage initialized"
        );

        Ok(S3Storage {
            builder,
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    pub fn default_bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// Client for `bucket`, reusing the default one when it matches.
    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        if bucket == self.bucket {
            return Ok(self.store.clone());
        }
        self.builder
            .clone()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        validate_object_path(bucket, key)?;
        let start = std::time::Instant::now();
        let store: Arc<dyn ObjectStore> = Arc::new(self.store_for(bucket)?);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let mut writer = BufWriter::new(store, Path::from(key)).with_attributes(attributes);

        let copied = tokio::io::copy(&mut reader, &mut writer).await;
        let result = match copied {
            Ok(size) => writer.shutdown().await.map(|_| size),
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload successful"
                );
                Ok(size)
            }
            Err(e) => {
                // Drop any parts already sent
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %bucket,
                        key = %key,
                        "Failed to abort S3 multipart upload"
                    );
                }
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload failed"
                );
                Err(StorageError::UploadFailed(e.to_string()))
            }
        }
    }

    async fn download_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        validate_object_path(bucket, key)?;
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let location = Path::from(key);

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => {
                StorageError::NotFound(format!("{}/{}", bucket, key))
            }
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bucket = bucket.to_string();
        let key = key.to_string();

        let stream = result.into_stream().map(move |res| match res {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
                Err(StorageError::DownloadFailed(e.to_string()))
            }
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        validate_object_path(bucket, key)?;
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let location = Path::from(key);

        match store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        validate_object_path(bucket, key)?;
        let store = self.store_for(bucket)?;
        let location = Path::from(key);
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_object_path(bucket, key)?;
        let store = self.store_for(bucket)?;
        let location = Path::from(key);
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;

    fn storage() -> S3Storage {
        let builder = AmazonS3Builder::new()
            .with_region("us-east-1")
            .with_endpoint("http://localhost:9000")
            .with_allow_http(true)
            .with_access_key_id("test-access-key")
            .with_secret_access_key("test-secret-key");
        S3Storage::from_builder(
            builder,
            "videos".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_presigned_url_names_bucket_and_key() {
        let storage = storage();
        let url = storage
            .get_presigned_url("videos", "portrait/a.mp4", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/videos/portrait/a.mp4?"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    async fn test_presigned_url_for_other_bucket() {
        let storage = storage();
        let url = storage
            .get_presigned_url("archive", "landscape/b.mp4", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/archive/landscape/b.mp4?"));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_network() {
        let storage = storage();
        let result = storage
            .get_presigned_url("videos", "../escape", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
