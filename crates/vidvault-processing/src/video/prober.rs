//! ffprobe-backed [`MediaProber`].

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::validation::{validate_media_file, validate_tool_path};
use crate::error::ProbeError;
use crate::metadata::{parse_probe_output, VideoMetadata};
use crate::traits::MediaProber;

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self, ProbeError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path).map_err(ProbeError::InvalidPath)?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn dimensions(&self, path: &Path) -> Result<VideoMetadata, ProbeError> {
        let start = std::time::Instant::now();
        validate_media_file(path).map_err(ProbeError::InvalidPath)?;

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropped on timeout; the child must not outlive the request.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let meta = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = meta.width,
            height = meta.height,
            "Video probe completed"
        );

        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidvault_core::AspectClassification;

    #[test]
    fn test_rejects_unsafe_tool_path() {
        assert!(matches!(
            FfprobeProber::new("ffprobe && curl evil"),
            Err(ProbeError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let prober = FfprobeProber::new("vidvault-no-such-ffprobe").unwrap();
        assert!(matches!(
            prober.probe(file.path()).await,
            Err(ProbeError::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let prober = FfprobeProber::new("false").unwrap();
        assert!(matches!(
            prober.probe(file.path()).await,
            Err(ProbeError::Failed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_json_output_is_invalid() {
        // `echo` prints its arguments and exits 0
        let file = tempfile::NamedTempFile::new().unwrap();
        let prober = FfprobeProber::new("echo").unwrap();
        assert!(matches!(
            prober.probe(file.path()).await,
            Err(ProbeError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_input_is_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let prober = FfprobeProber::new("ffprobe").unwrap();
        let result: Result<AspectClassification, _> =
            prober.probe(&dir.path().join("missing.mp4")).await;
        assert!(matches!(result, Err(ProbeError::InvalidPath(_))));
    }
}
