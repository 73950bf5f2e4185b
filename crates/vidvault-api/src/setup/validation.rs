//! Configuration validation
//!
//! Startup checks on top of [`Config::validate`] that only matter for the running server.

use anyhow::Result;
use vidvault_core::Config;
use vidvault_processing::{FastStartRewriter, FfprobeProber};

/// Validate critical configuration values, failing fast on anything that would only surface
/// later as a broken upload.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via CORS_ORIGINS."
        ));
    }

    if is_production && config.jwt_secret().len() < 32 {
        tracing::warn!(
            "JWT secret is shorter than 32 characters - consider using a longer, more secure secret"
        );
    }

    FfprobeProber::new(config.ffprobe_path())
        .map_err(|e| anyhow::anyhow!("Invalid FFPROBE_PATH: {}", e))?;
    FastStartRewriter::new(config.ffmpeg_path())
        .map_err(|e| anyhow::anyhow!("Invalid FFMPEG_PATH: {}", e))?;

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
