use std::process::ExitStatus;
use thiserror::Error;

/// Failures of the probing tool.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Failed to execute ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("Failed to parse ffprobe output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("No streams found in media file")]
    NoStreams,

    #[error("First stream has missing or zero dimensions")]
    MissingDimensions,
}

/// Failures of the container rewrite tool.
///
/// `Failed` keeps the tool's diagnostic output alongside its exit status.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Failed to execute ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("ffmpeg reported success but wrote no output at {0}")]
    MissingOutput(String),
}
