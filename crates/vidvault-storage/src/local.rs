use crate::signing::UrlSigner;
use crate::traits::{validate_object_path, ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncRead;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`. Presigned URLs point at the service's own
/// asset route and carry an HMAC signature checked by [`UrlSigner::verify`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signer: UrlSigner,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/vidvault/assets")
    /// * `base_url` - Base URL of the asset route (e.g., "http://localhost:8091/assets")
    /// * `signer` - Signs the URLs handed out by `get_presigned_url`
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signer: UrlSigner,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signer,
        })
    }

    /// Convert bucket and key to a filesystem path, refusing anything that escapes the base
    /// directory.
    fn key_to_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_object_path(bucket, key)?;

        let path = self.base_path.join(bucket).join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        } else if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(
        path: &Path,
        reader: &mut Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(bytes_copied)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_stream(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let path = self.key_to_path(bucket, key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let bytes_copied = match Self::write_file(&path, &mut reader).await {
            Ok(n) => n,
            Err(e) => {
                // No partial objects
                let _ = fs::remove_file(&path).await;
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream upload failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(bytes_copied)
    }

    async fn download_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        let path = self.key_to_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let key = key.to_string();
        let path_display = path.display().to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_object_path(bucket, key)?;
        let (expires, signature) = self.signer.sign(bucket, key, expires_in)?;
        Ok(format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url.trim_end_matches('/'),
            bucket,
            key,
            expires,
            signature
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir,
            "http://localhost:8091/assets".to_string(),
            UrlSigner::new("test-secret").unwrap(),
        )
        .await
        .unwrap()
    }

    fn reader(data: &[u8]) -> Pin<Box<dyn AsyncRead + Send + Unpin>> {
        Box::pin(std::io::Cursor::new(data.to_vec()))
    }

    #[tokio::test]
    async fn test_local_storage_stream_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let data = b"stream test data";

        let written = storage
            .upload_stream("videos", "portrait/a.mp4", "video/mp4", reader(data))
            .await
            .unwrap();
        assert_eq!(written, data.len() as u64);
        assert!(dir.path().join("videos/portrait/a.mp4").exists());

        let mut stream = storage
            .download_stream("videos", "portrait/a.mp4")
            .await
            .unwrap();
        let mut downloaded = Vec::new();
        while let Some(chunk) = stream.next().await {
            downloaded.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(downloaded, data);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.download_stream("videos", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("..", "etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("videos", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        assert!(storage.delete("videos", "nonexistent/file.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_exists_and_delete() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        storage
            .upload_stream("videos", "landscape/b.mp4", "video/mp4", reader(b"x"))
            .await
            .unwrap();
        assert!(storage.exists("videos", "landscape/b.mp4").await.unwrap());
        assert!(!storage.exists("other", "landscape/b.mp4").await.unwrap());

        storage.delete("videos", "landscape/b.mp4").await.unwrap();
        assert!(!storage.exists("videos", "landscape/b.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.download_stream("videos", "missing.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_presigned_url_carries_valid_signature() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let url = storage
            .get_presigned_url("videos", "portrait/a.mp4", Duration::from_secs(3600))
            .await
            .unwrap();
        let (path, query) = url.split_once('?').unwrap();
        assert_eq!(path, "http://localhost:8091/assets/videos/portrait/a.mp4");

        let mut expires = 0u64;
        let mut signature = String::new();
        for pair in query.split('&') {
            match pair.split_once('=').unwrap() {
                ("expires", v) => expires = v.parse().unwrap(),
                ("signature", v) => signature = v.to_string(),
                _ => {}
            }
        }
        let signer = UrlSigner::new("test-secret").unwrap();
        assert!(signer
            .verify("videos", "portrait/a.mp4", expires, &signature)
            .is_ok());
    }
}
