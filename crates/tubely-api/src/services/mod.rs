//! Services used by the HTTP handlers

pub mod signing;
pub mod thumbnail_cache;
pub mod upload;

pub use signing::sign_video;
pub use thumbnail_cache::{LruThumbnailCache, ThumbnailCache};
pub use upload::{read_thumbnail_field, receive_video_field};
