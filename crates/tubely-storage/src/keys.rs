//! Storage key generation.

use tubely_core::models::GeometryCategory;
use uuid::Uuid;

/// Generate a fresh key for a processed video: `{category}/{uuid}.mp4`.
pub fn video_key(category: GeometryCategory) -> String {
    format!("{}/{}.mp4", category, Uuid::new_v4().simple())
}

/// Reject keys that could escape a backend's namespace.
pub fn validate_key(storage_key: &str) -> bool {
    !storage_key.is_empty()
        && !storage_key.starts_with('/')
        && !storage_key.split('/').any(|segment| segment == ".." || segment.is_empty())
}
