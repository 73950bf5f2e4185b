//! Request-private staging of the upload body.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use vidvault_core::AppError;

/// Prefix of every per-request staging directory.
pub const STAGING_PREFIX: &str = "vidvault-upload-";

const STAGED_FILE_NAME: &str = "upload.mp4";
const CHUNK_SIZE: usize = 64 * 1024;

/// A staged upload. Dropping it removes the staging directory and everything the pipeline
/// wrote into it, including the rewriter's output.
pub struct StagedUpload {
    dir: TempDir,
    path: PathBuf,
    size: u64,
}

impl StagedUpload {
    /// Copy `body` into a fresh staging directory under `parent`, refusing more than
    /// `max_bytes`.
    pub async fn from_reader<R>(parent: &Path, body: &mut R, max_bytes: u64) -> Result<Self, AppError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| AppError::Internal(format!("Failed to create staging directory: {}", e)))?;
        let path = dir.path().join(STAGED_FILE_NAME);

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create staging file: {}", e)))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut size: u64 = 0;
        loop {
            let n = body.read(&mut buf).await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read upload body: {}", e))
            })?;
            if n == 0 {
                break;
            }
            size += n as u64;
            if size > max_bytes {
                return Err(AppError::BadRequest(format!(
                    "Video exceeds maximum allowed size of {} MB",
                    max_bytes / 1024 / 1024
                )));
            }
            file.write_all(&buf[..n])
                .await
                .map_err(|e| AppError::Internal(format!("Failed to write staging file: {}", e)))?;
        }

        if size == 0 {
            return Err(AppError::BadRequest("Uploaded video is empty".to_string()));
        }

        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to flush staging file: {}", e)))?;

        Ok(Self { dir, path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Remove the staging directory now, logging instead of failing.
    pub fn cleanup(self) {
        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(error = %e, dir = %dir.display(), "Failed to remove staging directory");
        }
    }
}

/// Media type without parameters, lowercased: `Video/MP4; codecs=avc1` -> `video/mp4`.
pub fn content_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}
