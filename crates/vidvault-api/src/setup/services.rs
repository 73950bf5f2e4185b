//! Service and repository wiring

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use vidvault_core::{Config, StorageBackend};
use vidvault_db::PgVideoRepository;
use vidvault_processing::{FastStartRewriter, FfprobeProber};
use vidvault_storage::{ReferenceResolver, Storage, UrlSigner};

use crate::auth::JwtAuthenticator;
use crate::services::upload::{UploadConfig, UploadOrchestrator};
use crate::state::AppState;

/// Build [`AppState`] from the connected pool and storage backend.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let authenticator = Arc::new(JwtAuthenticator::new(
        config.jwt_secret(),
        config.jwt_issuer(),
    ));
    let videos = Arc::new(PgVideoRepository::new(pool));

    let prober = Arc::new(
        FfprobeProber::new(config.ffprobe_path()).context("Invalid FFPROBE_PATH")?,
    );
    let rewriter = Arc::new(
        FastStartRewriter::new(config.ffmpeg_path()).context("Invalid FFMPEG_PATH")?,
    );

    let upload_config = UploadConfig::from_config(config);
    tracing::info!(
        bucket = %upload_config.bucket,
        max_upload_mb = upload_config.max_upload_bytes / 1024 / 1024,
        staging_dir = %upload_config.staging_dir.display(),
        external_call_timeout_secs = upload_config.external_call_timeout.as_secs(),
        reference_mode = %upload_config.reference_mode,
        "Upload pipeline configured"
    );

    let uploads = UploadOrchestrator::new(
        authenticator.clone(),
        videos.clone(),
        prober,
        rewriter,
        storage.clone(),
        upload_config,
    );

    let resolver = ReferenceResolver::new(
        storage.clone(),
        Duration::from_secs(config.presigned_url_ttl_secs()),
    );

    // Only the local backend hands out links to this service's own asset route
    let asset_signer = match config.storage_backend() {
        StorageBackend::Local => Some(
            UrlSigner::new(config.local_storage_signing_secret())
                .context("Invalid LOCAL_STORAGE_SIGNING_SECRET")?,
        ),
        StorageBackend::S3 => None,
    };

    Ok(Arc::new(AppState {
        videos,
        storage,
        resolver,
        authenticator,
        uploads,
        asset_signer,
    }))
}
