//! Values shared between the HTTP layer and the upload pipeline.

/// The only container accepted for video uploads.
pub const VIDEO_MP4: &str = "video/mp4";

/// Default upper bound for a single video upload (10 GiB).
pub const DEFAULT_MAX_VIDEO_SIZE_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Default upper bound for a thumbnail upload (10 MiB).
pub const DEFAULT_MAX_THUMBNAIL_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default lifetime of a presigned video URL.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;
