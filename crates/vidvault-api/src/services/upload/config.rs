use std::path::PathBuf;
use std::time::Duration;
use vidvault_core::{Config, ReferenceMode};

/// Settings the orchestrator needs, lifted out of [`Config`] once at startup.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bucket new uploads are written to
    pub bucket: String,
    pub max_upload_bytes: u64,
    /// Parent directory for per-request staging directories
    pub staging_dir: PathBuf,
    /// Deadline applied to each external call (probe, rewrite, upload, record update)
    pub external_call_timeout: Duration,
    pub reference_mode: ReferenceMode,
    pub public_base_url: Option<String>,
}

impl UploadConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.upload_bucket().to_string(),
            max_upload_bytes: config.max_video_size_bytes(),
            staging_dir: config.upload_staging_dir().to_path_buf(),
            external_call_timeout: Duration::from_secs(config.external_call_timeout_secs()),
            reference_mode: config.video_reference_mode(),
            public_base_url: config.public_base_url().map(String::from),
        }
    }
}
