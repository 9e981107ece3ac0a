//! Application setup and wiring

pub mod routes;
pub mod server;

use crate::auth::JwtValidator;
use crate::services::{LruThumbnailCache, ThumbnailCache};
use crate::state::AppState;
use anyhow::Context;
use axum::Router;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tubely_core::{Config, StorageBackend};
use tubely_db::VideoRepository;
use tubely_processing::{
    FfmpegRemuxer, FfprobeProber, MediaProber, PipelineConfig, Remuxer, UploadPipeline,
    UploadValidator,
};
use tubely_storage::{create_local_storage, create_storage, LocalStorage, Storage};

/// Initialize database, storage and the upload pipeline, then build the router.
pub async fn initialize_app(config: Config) -> anyhow::Result<(Arc<AppState>, Router)> {
    tracing::info!(
        database_url = %config.base.database_url,
        storage_backend = %config.storage.backend,
        "Initializing application"
    );

    let pool = tubely_db::connect(&config.base.database_url, config.base.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    let videos = VideoRepository::new(pool);

    let (storage, local_assets): (Arc<dyn Storage>, Option<Arc<LocalStorage>>) =
        match config.storage.backend {
            StorageBackend::Local => {
                let local = Arc::new(create_local_storage(&config).await?);
                let storage: Arc<dyn Storage> = local.clone();
                (storage, Some(local))
            }
            StorageBackend::S3 => (create_storage(&config).await?, None),
        };
    tracing::info!(backend = %storage.backend_type(), "Storage initialized");

    let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::new(&config.media.ffprobe_path));
    let remuxer: Arc<dyn Remuxer> = Arc::new(FfmpegRemuxer::new(&config.media.ffmpeg_path));

    let state = build_state(config.clone(), videos, storage, local_assets, prober, remuxer)?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Assemble [`AppState`] from already constructed backends.
pub fn build_state(
    config: Config,
    videos: VideoRepository,
    storage: Arc<dyn Storage>,
    local_assets: Option<Arc<LocalStorage>>,
    prober: Arc<dyn MediaProber>,
    remuxer: Arc<dyn Remuxer>,
) -> anyhow::Result<Arc<AppState>> {
    let capacity = NonZeroUsize::new(config.media.thumbnail_cache_capacity)
        .context("THUMBNAIL_CACHE_CAPACITY must be greater than 0")?;
    let thumbnails: Arc<dyn ThumbnailCache> = Arc::new(LruThumbnailCache::new(capacity));

    let pipeline = UploadPipeline::new(
        prober,
        remuxer,
        storage.clone(),
        PipelineConfig::from_config(&config),
    );

    Ok(Arc::new(AppState {
        jwt: JwtValidator::new(config.jwt_secret()),
        video_validator: UploadValidator::video(
            config.media.max_video_size_bytes,
            &config.media.video_content_type,
        ),
        thumbnail_validator: UploadValidator::image(config.media.max_thumbnail_size_bytes),
        videos,
        storage,
        local_assets,
        pipeline: Arc::new(pipeline),
        thumbnails,
        config,
    }))
}
