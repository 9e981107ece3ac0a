//! Tubely Processing Library
//!
//! The video upload pipeline: probe the received file, classify its geometry, remux it for
//! fast-start playback, upload it to the object store, and remove every temporary artifact.

pub mod artifact;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod prober;
pub mod remuxer;
pub mod validator;

pub use artifact::{ArtifactSet, LocalArtifact};
pub use error::{CleanupError, PipelineError, ProbeError, RemuxError};
pub use geometry::{classify, Geometry};
pub use pipeline::{PipelineConfig, UploadOutcome, UploadPipeline};
pub use prober::{parse_probe_output, FfprobeProber, MediaProber};
pub use remuxer::{processed_path, FfmpegRemuxer, Remuxer};
pub use validator::{UploadValidator, ValidationError, THUMBNAIL_CONTENT_TYPES};
