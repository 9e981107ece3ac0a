//! Pipeline error taxonomy.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tubely_storage::StorageError;

/// Failure of the format analysis step.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("could not parse ffprobe output: {0}")]
    Parse(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u64, height: u64 },

    #[error("ffprobe timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of the fast-start remux step.
#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),
}

/// Terminal failure of one pipeline invocation.
///
/// None of these are retried; the handler reports a generic processing failure and the stage
/// detail only reaches the logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("remux failed: {0}")]
    Remux(#[from] RemuxError),

    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("upload timed out after {0:?}")]
    UploadTimeout(Duration),

    #[error("uploaded object {key} is {actual} bytes, expected {expected}")]
    IntegrityMismatch {
        key: String,
        expected: u64,
        actual: u64,
    },
}

impl PipelineError {
    /// Name of the stage that failed, for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Probe(_) => "probe",
            PipelineError::Remux(_) => "remux",
            PipelineError::Upload(_)
            | PipelineError::UploadTimeout(_)
            | PipelineError::IntegrityMismatch { .. } => "upload",
        }
    }
}

/// A temporary artifact that could not be removed. Logged, never returned to callers.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineError::from(ProbeError::NoVideoStream).stage(), "probe");
        assert_eq!(
            PipelineError::from(RemuxError::Timeout(Duration::from_secs(1))).stage(),
            "remux"
        );
        assert_eq!(
            PipelineError::from(StorageError::UploadFailed("boom".to_string())).stage(),
            "upload"
        );
        assert_eq!(
            PipelineError::IntegrityMismatch {
                key: "other/a.mp4".to_string(),
                expected: 10,
                actual: 9,
            }
            .stage(),
            "upload"
        );
    }
}
