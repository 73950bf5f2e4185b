//! Storage abstraction trait
//!
//! Every operation names its bucket explicitly. Stored references carry their own bucket, so a
//! backend must be able to address objects outside the bucket new uploads go to.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign URL: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked object body returned by downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` to `bucket/key` from its current position until EOF, recording
    /// `content_type` as object metadata. Returns the number of bytes written.
    ///
    /// Nothing is retried; a failed upload leaves no object behind.
    async fn upload_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64>;

    /// Download an object as a stream of chunks
    async fn download_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Generate a time-limited, pre-authenticated GET URL
    async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys and bucket names that could escape their namespace.
pub(crate) fn validate_object_path(bucket: &str, key: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
