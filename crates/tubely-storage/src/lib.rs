//! Tubely Storage Library
//!
//! Object store abstraction with S3 and local filesystem backends.
//!
//! # Storage key format
//!
//! Video keys are partitioned by frame geometry: `{portrait|landscape|other}/{id}.mp4`, where
//! `id` is a freshly generated UUID v4 in simple form. Keys are never reused. Key generation is
//! centralized in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use factory::create_local_storage;
pub use keys::video_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
