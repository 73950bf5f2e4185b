//! Capability traits for the external media tools.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use vidvault_core::AspectClassification;

use crate::error::{ProbeError, RewriteError};
use crate::metadata::VideoMetadata;

/// Reads stream dimensions from a local media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn dimensions(&self, path: &Path) -> Result<VideoMetadata, ProbeError>;

    /// Probe and classify by aspect ratio.
    async fn probe(&self, path: &Path) -> Result<AspectClassification, ProbeError> {
        let meta = self.dimensions(path).await?;
        Ok(AspectClassification::from_dimensions(meta.width, meta.height))
    }
}

/// Rewrites a local media file into a streaming-friendly layout.
///
/// Returns the path of the new file. The input is left in place; removing both files is the
/// caller's job.
#[async_trait]
pub trait ContainerRewriter: Send + Sync {
    async fn rewrite(&self, input: &Path) -> Result<PathBuf, RewriteError>;
}
