//! In-memory thumbnail store.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tubely_core::models::Thumbnail;
use uuid::Uuid;

/// Thumbnails keyed by the video they belong to.
#[async_trait]
pub trait ThumbnailCache: Send + Sync {
    async fn get(&self, video_id: Uuid) -> Option<Thumbnail>;

    /// Store `thumbnail`, replacing any previous one for the video.
    async fn put(&self, video_id: Uuid, thumbnail: Thumbnail);
}

/// Bounded cache that evicts the least recently used thumbnail when full.
pub struct LruThumbnailCache {
    entries: Mutex<LruCache<Uuid, Thumbnail>>,
}

impl LruThumbnailCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl ThumbnailCache for LruThumbnailCache {
    async fn get(&self, video_id: Uuid) -> Option<Thumbnail> {
        self.entries.lock().await.get(&video_id).cloned()
    }

    async fn put(&self, video_id: Uuid, thumbnail: Thumbnail) {
        let evicted = self.entries.lock().await.push(video_id, thumbnail);
        if let Some((evicted_id, _)) = evicted {
            if evicted_id != video_id {
                tracing::debug!(video_id = %evicted_id, "Evicted thumbnail from cache");
            }
        }
    }
}
