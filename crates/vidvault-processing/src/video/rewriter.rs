//! ffmpeg faststart rewrite.
//!
//! Copies every stream without re-encoding and moves the `moov` atom to the front of the file so
//! playback can begin before the download completes.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::validation::{validate_media_file, validate_tool_path};
use crate::error::RewriteError;
use crate::traits::ContainerRewriter;

/// Suffix appended to the input path to name the rewritten file.
pub const OUTPUT_SUFFIX: &str = ".processing";

pub struct FastStartRewriter {
    ffmpeg_path: String,
}

impl FastStartRewriter {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self, RewriteError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path).map_err(RewriteError::InvalidPath)?;
        Ok(Self { ffmpeg_path })
    }

    pub fn output_path_for(input: &Path) -> PathBuf {
        let mut name = OsString::from(input.as_os_str());
        name.push(OUTPUT_SUFFIX);
        PathBuf::from(name)
    }
}

#[async_trait]
impl ContainerRewriter for FastStartRewriter {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn rewrite(&self, input: &Path) -> Result<PathBuf, RewriteError> {
        let start = std::time::Instant::now();
        validate_media_file(input).map_err(RewriteError::InvalidPath)?;
        let output_path = Self::output_path_for(input);

        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(RewriteError::Spawn)?;

        if !output.status.success() {
            return Err(RewriteError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(RewriteError::MissingOutput(
                output_path.display().to_string(),
            ));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output = %output_path.display(),
            "Faststart rewrite completed"
        );

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_suffixed() {
        assert_eq!(
            FastStartRewriter::output_path_for(Path::new("/tmp/x/upload.mp4")),
            PathBuf::from("/tmp/x/upload.mp4.processing")
        );
    }

    #[test]
    fn test_rejects_unsafe_tool_path() {
        assert!(matches!(
            FastStartRewriter::new("ffmpeg`id`"),
            Err(RewriteError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let rewriter = FastStartRewriter::new("vidvault-no-such-ffmpeg").unwrap();
        assert!(matches!(
            rewriter.rewrite(file.path()).await,
            Err(RewriteError::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let rewriter = FastStartRewriter::new("false").unwrap();
        assert!(matches!(
            rewriter.rewrite(file.path()).await,
            Err(RewriteError::Failed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let rewriter = FastStartRewriter::new("true").unwrap();
        assert!(matches!(
            rewriter.rewrite(file.path()).await,
            Err(RewriteError::MissingOutput(_))
        ));
    }
}
