//! Probe output parsing.

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Dimensions of the first stream reported by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse `ffprobe -print_format json -show_streams` output and take the first stream's
/// dimensions.
pub fn parse_probe_output(stdout: &[u8]) -> Result<VideoMetadata, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;
    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Ok(VideoMetadata { width, height })
        }
        _ => Err(ProbeError::MissingDimensions),
    }
}
