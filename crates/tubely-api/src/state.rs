//! Application state shared by all handlers.

use crate::auth::JwtValidator;
use crate::services::ThumbnailCache;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{UploadPipeline, UploadValidator};
use tubely_storage::{LocalStorage, Storage};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: VideoRepository,
    pub storage: Arc<dyn Storage>,
    /// Set when objects are kept on local disk and served by `/assets`.
    pub local_assets: Option<Arc<LocalStorage>>,
    pub pipeline: Arc<UploadPipeline>,
    pub thumbnails: Arc<dyn ThumbnailCache>,
    pub jwt: JwtValidator,
    pub video_validator: UploadValidator,
    pub thumbnail_validator: UploadValidator,
}
