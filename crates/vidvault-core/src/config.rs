//! Configuration module
//!
//! Configuration is loaded once from the environment (and an optional `.env` file) into an
//! explicit struct that is handed to each component at construction.

use std::env;
use std::path::PathBuf;

use crate::storage_types::{ReferenceMode, StorageBackend};

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SERVER_PORT: u16 = 8091;
const JWT_ISSUER: &str = "vidvault-access";
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const EXTERNAL_CALL_TIMEOUT_SECS: u64 = 300;
const PRESIGNED_URL_TTL_SECS: u64 = 60 * 60;

/// Settings every deployment needs regardless of storage backend.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub cors_origins: Vec<String>,
    pub log_format: String,
}

/// Full service configuration.
#[derive(Clone, Debug)]
pub struct VideoServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub local_storage_signing_secret: String,
    // Processing configuration
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub max_video_size_bytes: u64,
    pub upload_staging_dir: PathBuf,
    pub external_call_timeout_secs: u64,
    // Delivery configuration
    pub presigned_url_ttl_secs: u64,
    pub video_reference_mode: ReferenceMode,
    pub public_base_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<VideoServiceConfig>);

impl Config {
    fn inner(&self) -> &VideoServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = VideoServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_issuer(&self) -> &str {
        &self.inner().base.jwt_issuer
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.inner().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.inner().local_storage_base_url
    }

    pub fn local_storage_signing_secret(&self) -> &str {
        &self.inner().local_storage_signing_secret
    }

    /// Bucket the pipeline writes new uploads into.
    ///
    /// The local backend uses the same name as a top-level directory under its root.
    pub fn upload_bucket(&self) -> &str {
        self.inner().s3_bucket.as_deref().unwrap_or("videos")
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.inner().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().max_video_size_bytes
    }

    pub fn upload_staging_dir(&self) -> &std::path::Path {
        &self.inner().upload_staging_dir
    }

    pub fn external_call_timeout_secs(&self) -> u64 {
        self.inner().external_call_timeout_secs
    }

    pub fn presigned_url_ttl_secs(&self) -> u64 {
        self.inner().presigned_url_ttl_secs
    }

    pub fn video_reference_mode(&self) -> ReferenceMode {
        self.inner().video_reference_mode
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.inner().public_base_url.as_deref()
    }
}

/// Asset link base for the local backend when none is configured, served by this process.
fn default_local_base_url(port: u16) -> String {
    format!("http://localhost:{}/assets", port)
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl VideoServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?;

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: jwt_secret.clone(),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| JWT_ISSUER.to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        };

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let video_reference_mode = env::var("VIDEO_REFERENCE_MODE")
            .unwrap_or_else(|_| "signed".to_string())
            .parse::<ReferenceMode>()?;

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let upload_staging_dir = optional_var("UPLOAD_STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let server_port = base.server_port;
        let config = VideoServiceConfig {
            base,
            database_url,
            storage_backend,
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION"),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            aws_region: optional_var("AWS_REGION"),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./assets".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| default_local_base_url(server_port)),
            local_storage_signing_secret: optional_var("LOCAL_STORAGE_SIGNING_SECRET")
                .unwrap_or(jwt_secret),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            max_video_size_bytes: max_video_size_mb.saturating_mul(1024 * 1024),
            upload_staging_dir,
            external_call_timeout_secs: env::var("EXTERNAL_CALL_TIMEOUT_SECS")
                .unwrap_or_else(|_| EXTERNAL_CALL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(EXTERNAL_CALL_TIMEOUT_SECS),
            presigned_url_ttl_secs: env::var("PRESIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| PRESIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(PRESIGNED_URL_TTL_SECS),
            video_reference_mode,
            public_base_url: optional_var("PUBLIC_BASE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.is_empty() {
            return Err(anyhow::anyhow!(
                "JWT secret cannot be empty - set JWT_SECRET environment variable"
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("Max video size cannot be 0"));
        }

        if self.external_call_timeout_secs == 0 {
            return Err(anyhow::anyhow!("External call timeout cannot be 0"));
        }

        if self.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("Presigned URL TTL cannot be 0"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.video_reference_mode == ReferenceMode::Public && self.public_base_url.is_none() {
            return Err(anyhow::anyhow!(
                "PUBLIC_BASE_URL must be set when VIDEO_REFERENCE_MODE=public"
            ));
        }

        if !self.upload_staging_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "UPLOAD_STAGING_DIR {} is not a directory",
                self.upload_staging_dir.display()
            ));
        }

        Ok(())
    }
}
