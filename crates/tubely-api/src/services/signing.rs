use std::time::Duration;
use tubely_core::models::Video;
use tubely_storage::{Storage, StorageResult};

/// Replace the stored key in `video_url` with a freshly presigned URL.
///
/// The key is what gets persisted; URLs are minted per response and never written back.
pub async fn sign_video(
    storage: &dyn Storage,
    mut video: Video,
    expires_in: Duration,
) -> StorageResult<Video> {
    if let Some(key) = video.video_url.take() {
        video.video_url = Some(storage.presigned_get_url(&key, expires_in).await?);
    }
    Ok(video)
}
