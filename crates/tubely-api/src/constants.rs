//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Path under which the local backend serves presigned objects.
pub const ASSETS_PREFIX: &str = "/assets";

/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Allowance for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;
