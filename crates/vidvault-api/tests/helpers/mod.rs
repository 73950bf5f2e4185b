//! Shared fixtures for the API integration tests.
//!
//! Everything external is faked: records live in memory, the media tools are replaced by
//! deterministic stand-ins and objects go to local storage in a temp dir.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower_http::cors::CorsLayer;
use uuid::Uuid;
use vidvault_api::auth::JwtAuthenticator;
use vidvault_api::setup::routes::router_with_layers;
use vidvault_api::{AppState, UploadConfig, UploadOrchestrator};
use vidvault_core::{AppError, ReferenceMode, VideoRecord};
use vidvault_db::VideoStore;
use vidvault_processing::{
    ContainerRewriter, FastStartRewriter, MediaProber, ProbeError, RewriteError, VideoMetadata,
};
use tokio::io::AsyncRead;
use vidvault_storage::{
    ByteStream, LocalStorage, ReferenceResolver, Storage, StorageBackend, StorageError,
    StorageResult, UrlSigner,
};

pub const JWT_SECRET: &str = "integration-test-secret-0123456789";
pub const JWT_ISSUER: &str = "vidvault-access";
pub const SIGNING_SECRET: &str = "asset-signing-secret";
pub const ASSET_BASE_URL: &str = "http://localhost:8091/assets";
pub const BUCKET: &str = "videos";

/// Bytes standing in for an MP4 file; the fakes never parse them.
pub const SAMPLE_VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42 not really a movie";

// ----- Video store -----

#[derive(Default)]
pub struct InMemoryVideoStore {
    videos: Mutex<HashMap<Uuid, VideoRecord>>,
    updates: AtomicUsize,
    fail_updates: AtomicBool,
    stall_after_update: AtomicBool,
}

impl InMemoryVideoStore {
    pub fn insert(&self, video: VideoRecord) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn get(&self, id: Uuid) -> Option<VideoRecord> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    /// Apply updates, then hang before answering, like a commit whose reply is lost.
    pub fn stall_after_update(&self) {
        self.stall_after_update.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.get(id))
    }

    async fn update_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("database unavailable".to_string()));
        }
        let updated = {
            let mut videos = self.videos.lock().unwrap();
            let stored = videos
                .get_mut(&video.id)
                .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video.id)))?;
            *stored = VideoRecord {
                updated_at: Utc::now(),
                ..video.clone()
            };
            stored.clone()
        };
        self.updates.fetch_add(1, Ordering::SeqCst);

        if self.stall_after_update.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(updated)
    }

    async fn list_videos_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoRecord>, AppError> {
        let mut owned: Vec<VideoRecord> = self
            .videos
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

// ----- Object storage -----

/// Local storage with switchable failures.
pub struct FaultyStorage {
    inner: LocalStorage,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    fail_presign: AtomicBool,
}

impl FaultyStorage {
    pub fn new(inner: LocalStorage) -> Self {
        Self {
            inner,
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_presign: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn fail_presign(&self) {
        self.fail_presign.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn upload_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("bucket unreachable".to_string()));
        }
        self.inner
            .upload_stream(bucket, key, content_type, reader)
            .await
    }

    async fn download_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        self.inner.download_stream(bucket, key).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("bucket unreachable".to_string()));
        }
        self.inner.delete(bucket, key).await
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.inner.exists(bucket, key).await
    }

    async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::SigningFailed("no credentials".to_string()));
        }
        self.inner.get_presigned_url(bucket, key, expires_in).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

// ----- Media tools -----

/// Reports the same dimensions for every file.
pub struct FixedProber {
    pub width: u32,
    pub height: u32,
}

impl FixedProber {
    pub fn portrait() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }

    pub fn landscape() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }

    pub fn square() -> Self {
        Self {
            width: 1000,
            height: 1000,
        }
    }
}

#[async_trait]
impl MediaProber for FixedProber {
    async fn dimensions(&self, path: &Path) -> Result<VideoMetadata, ProbeError> {
        assert!(path.exists(), "prober called on a missing file");
        Ok(VideoMetadata {
            width: self.width,
            height: self.height,
        })
    }
}

pub struct FailingProber;

#[async_trait]
impl MediaProber for FailingProber {
    async fn dimensions(&self, _path: &Path) -> Result<VideoMetadata, ProbeError> {
        Err(ProbeError::NoStreams)
    }
}

/// Never answers within any reasonable deadline.
pub struct HangingProber;

#[async_trait]
impl MediaProber for HangingProber {
    async fn dimensions(&self, _path: &Path) -> Result<VideoMetadata, ProbeError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ProbeError::NoStreams)
    }
}

/// Copies the input to where the real rewriter would write its output.
pub struct CopyRewriter;

#[async_trait]
impl ContainerRewriter for CopyRewriter {
    async fn rewrite(&self, input: &Path) -> Result<PathBuf, RewriteError> {
        let output = FastStartRewriter::output_path_for(input);
        tokio::fs::copy(input, &output)
            .await
            .map_err(RewriteError::Spawn)?;
        Ok(output)
    }
}

/// Writes a partial output file and then fails, like a tool that died mid-run.
pub struct FailingRewriter;

#[async_trait]
impl ContainerRewriter for FailingRewriter {
    async fn rewrite(&self, input: &Path) -> Result<PathBuf, RewriteError> {
        let output = FastStartRewriter::output_path_for(input);
        tokio::fs::write(&output, b"partial")
            .await
            .map_err(RewriteError::Spawn)?;
        Err(RewriteError::MissingOutput(output.display().to_string()))
    }
}

// ----- Context -----

pub struct TestOptions {
    pub prober: Arc<dyn MediaProber>,
    pub rewriter: Arc<dyn ContainerRewriter>,
    pub reference_mode: ReferenceMode,
    pub public_base_url: Option<String>,
    pub max_upload_bytes: u64,
    pub external_call_timeout: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            prober: Arc::new(FixedProber::portrait()),
            rewriter: Arc::new(CopyRewriter),
            reference_mode: ReferenceMode::Signed,
            public_base_url: None,
            max_upload_bytes: 1024 * 1024,
            external_call_timeout: Duration::from_secs(10),
        }
    }
}

pub struct TestContext {
    pub store: Arc<InMemoryVideoStore>,
    pub storage: Arc<FaultyStorage>,
    pub authenticator: Arc<JwtAuthenticator>,
    pub state: Arc<AppState>,
    pub storage_dir: TempDir,
    pub staging_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_prober(prober: Arc<dyn MediaProber>) -> Self {
        Self::with_options(TestOptions {
            prober,
            ..TestOptions::default()
        })
        .await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let staging_dir = tempfile::tempdir().unwrap();

        let store = Arc::new(InMemoryVideoStore::default());
        let storage = Arc::new(FaultyStorage::new(
            LocalStorage::new(
                storage_dir.path(),
                ASSET_BASE_URL.to_string(),
                UrlSigner::new(SIGNING_SECRET).unwrap(),
            )
            .await
            .unwrap(),
        ));
        let authenticator = Arc::new(JwtAuthenticator::new(JWT_SECRET, JWT_ISSUER));

        let config = UploadConfig {
            bucket: BUCKET.to_string(),
            max_upload_bytes: options.max_upload_bytes,
            staging_dir: staging_dir.path().to_path_buf(),
            external_call_timeout: options.external_call_timeout,
            reference_mode: options.reference_mode,
            public_base_url: options.public_base_url,
        };

        let uploads = UploadOrchestrator::new(
            authenticator.clone(),
            store.clone(),
            options.prober,
            options.rewriter,
            storage.clone(),
            config,
        );

        let state = Arc::new(AppState {
            videos: store.clone(),
            storage: storage.clone(),
            resolver: ReferenceResolver::new(storage.clone(), Duration::from_secs(3600)),
            authenticator: authenticator.clone(),
            uploads,
            asset_signer: Some(UrlSigner::new(SIGNING_SECRET).unwrap()),
        });

        Self {
            store,
            storage,
            authenticator,
            state,
            storage_dir,
            staging_dir,
        }
    }

    pub fn router(&self) -> Router {
        router_with_layers(self.state.clone(), CorsLayer::new(), 16)
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.authenticator
            .issue_token(user_id, ChronoDuration::hours(1))
            .unwrap()
    }

    /// Insert a record owned by `owner` with no video yet.
    pub fn seed_video(&self, owner: Uuid) -> VideoRecord {
        self.seed_video_with_url(owner, None)
    }

    pub fn seed_video_with_url(&self, owner: Uuid, video_url: Option<&str>) -> VideoRecord {
        let now = Utc::now();
        let video = VideoRecord {
            id: Uuid::new_v4(),
            user_id: owner,
            title: "Boot.dev beach trip".to_string(),
            description: "waves".to_string(),
            thumbnail_url: None,
            video_url: video_url.map(String::from),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(video.clone());
        video
    }

    /// Entries left in the staging directory.
    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(self.staging_dir.path()).unwrap().count()
    }

    /// Keys of every object in the upload bucket, relative to the bucket.
    pub fn stored_keys(&self) -> Vec<String> {
        let bucket_dir = self.storage_dir.path().join(BUCKET);
        let mut keys = Vec::new();
        collect_files(&bucket_dir, &bucket_dir, &mut keys);
        keys.sort();
        keys
    }

    pub fn stored_object(&self, key: &str) -> Vec<u8> {
        std::fs::read(self.storage_dir.path().join(BUCKET).join(key)).unwrap()
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else {
            out.push(
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/"),
            );
        }
    }
}

/// Split a stored `bucket,key` reference.
pub fn key_of(reference: &str) -> String {
    let (bucket, key) = reference.split_once(',').unwrap();
    assert_eq!(bucket, BUCKET);
    key.to_string()
}
