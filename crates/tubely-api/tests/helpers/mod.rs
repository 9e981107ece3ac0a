//! Test helpers: build AppState and router for integration tests.
//!
//! Each app gets an in-memory database and its own storage and temp directories. ffprobe and
//! ffmpeg are replaced by [`FakeProber`] and [`CopyRemuxer`] unless [`TestOptions`] swaps
//! in other backends.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::constants;
use tubely_api::setup::{build_state, routes};
use tubely_api::AppState;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{Geometry, MediaProber, ProbeError, RemuxError, Remuxer};
use tubely_storage::{
    create_local_storage, LocalStorage, Storage, StorageBackend, StorageError, StorageResult,
};

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";
pub const TEST_MAX_VIDEO_SIZE: u64 = 1024 * 1024;
pub const TEST_MAX_THUMBNAIL_SIZE: u64 = 4 * 1024;
pub const TEST_ASSETS_BASE_URL: &str = "http://localhost/assets";

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub temp_root: PathBuf,
    pub _storage_dir: TempDir,
    pub _work_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn videos(&self) -> &VideoRepository {
        &self.state.videos
    }

    /// Number of entries left in the temp root.
    pub fn temp_entries(&self) -> usize {
        match std::fs::read_dir(&self.temp_root) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// Geometry is chosen from the first bytes of the uploaded file; see [`fixtures`].
pub struct FakeProber;

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<Geometry, ProbeError> {
        let data = tokio::fs::read(path).await.map_err(ProbeError::Spawn)?;
        if data.starts_with(fixtures::LANDSCAPE_MAGIC) {
            Ok(Geometry::new(1920, 1080))
        } else if data.starts_with(fixtures::PORTRAIT_MAGIC) {
            Ok(Geometry::new(1080, 1920))
        } else if data.starts_with(fixtures::SQUARE_MAGIC) {
            Ok(Geometry::new(720, 720))
        } else {
            Err(ProbeError::NoVideoStream)
        }
    }
}

/// Stands in for the faststart remux by copying the bytes.
pub struct CopyRemuxer;

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        tokio::fs::copy(input, output)
            .await
            .map(|_| ())
            .map_err(RemuxError::Spawn)
    }
}

/// Writes partial output, then fails like an ffmpeg crash.
pub struct FailingRemuxer;

#[async_trait]
impl Remuxer for FailingRemuxer {
    async fn remux(&self, _input: &Path, output: &Path) -> Result<(), RemuxError> {
        tokio::fs::write(output, b"partial")
            .await
            .map_err(RemuxError::Spawn)?;
        Err(RemuxError::Failed {
            status: Some(1),
            stderr: "moov atom not found".to_string(),
        })
    }
}

/// Local storage whose uploads always fail; everything else is delegated.
pub struct FailingUploadStorage {
    inner: Arc<LocalStorage>,
}

#[async_trait]
impl Storage for FailingUploadStorage {
    async fn upload_file(
        &self,
        _local_path: &Path,
        _storage_key: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        Err(StorageError::UploadFailed("connection reset".to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn presigned_get_url(
        &self,
        storage_key: &str,
        expires_in: std::time::Duration,
    ) -> StorageResult<String> {
        self.inner.presigned_get_url(storage_key, expires_in).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.inner.content_length(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

/// Backends swapped into a [`TestApp`].
pub struct TestOptions {
    pub remuxer: Arc<dyn Remuxer>,
    pub fail_uploads: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            remuxer: Arc::new(CopyRemuxer),
            fail_uploads: false,
        }
    }
}

fn create_test_config(storage_dir: &Path, temp_root: &Path) -> Config {
    let vars: HashMap<String, String> = [
        ("JWT_SECRET", TEST_JWT_SECRET.to_string()),
        ("DATABASE_URL", "sqlite::memory:".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", storage_dir.display().to_string()),
        ("LOCAL_STORAGE_BASE_URL", TEST_ASSETS_BASE_URL.to_string()),
        ("TEMP_ROOT", temp_root.display().to_string()),
        ("MAX_VIDEO_SIZE_BYTES", TEST_MAX_VIDEO_SIZE.to_string()),
        ("MAX_THUMBNAIL_SIZE_BYTES", TEST_MAX_THUMBNAIL_SIZE.to_string()),
        ("PRESIGN_EXPIRY_SECS", "3600".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    Config::from_map(&vars).expect("Failed to build test config")
}

/// Setup test app with an isolated database and local storage.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let storage_dir = TempDir::new().expect("Failed to create storage dir");
    let work_dir = TempDir::new().expect("Failed to create work dir");
    let temp_root = work_dir.path().join("uploads");

    let config = create_test_config(storage_dir.path(), &temp_root);

    let pool = tubely_db::connect(&config.base.database_url, 1)
        .await
        .expect("Failed to connect to test database");
    let videos = VideoRepository::new(pool);

    let local = Arc::new(
        create_local_storage(&config)
            .await
            .expect("Failed to create local storage"),
    );
    let storage: Arc<dyn Storage> = if options.fail_uploads {
        Arc::new(FailingUploadStorage {
            inner: local.clone(),
        })
    } else {
        local.clone()
    };

    let state = build_state(
        config.clone(),
        videos,
        storage,
        Some(local),
        Arc::new(FakeProber),
        options.remuxer,
    )
    .expect("Failed to build state");

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        temp_root,
        _storage_dir: storage_dir,
        _work_dir: work_dir,
    }
}
