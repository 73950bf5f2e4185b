//! Vidvault Media Processing Library
//!
//! Wraps the two external tools the upload pipeline shells out to: `ffprobe` for stream
//! dimensions and `ffmpeg` for the faststart container rewrite. Both sit behind traits so the
//! pipeline can run against deterministic fakes.

pub mod error;
pub mod metadata;
pub mod traits;
pub mod video;

// Re-export commonly used types
pub use error::{ProbeError, RewriteError};
pub use metadata::VideoMetadata;
pub use traits::{ContainerRewriter, MediaProber};
pub use video::{FastStartRewriter, FfprobeProber};
