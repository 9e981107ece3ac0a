//! Fast-start remuxing with ffmpeg.
//!
//! Moves the MP4 `moov` atom to the front of the file so playback can start before the whole
//! file has downloaded. Streams are copied, never re-encoded.

use crate::error::RemuxError;
use crate::prober::stderr_excerpt;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Write a fast-start copy of `input` to `output`. `input` is left untouched.
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError>;
}

/// Where the remuxed copy of `input` is written: `<stem>.processed.mp4` next to it.
pub fn processed_path(input: &Path) -> PathBuf {
    input.with_extension("processed.mp4")
}

pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.as_os_str().to_owned()];
        args.extend(
            [
                "-movflags",
                "faststart",
                "-map_metadata",
                "0",
                "-codec",
                "copy",
                "-f",
                "mp4",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffmpeg_path,
        input = %input.display(),
        output = %output.display()
    ))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        let start = std::time::Instant::now();

        // Killed if the caller's timeout drops this future.
        let result = Command::new(&self.ffmpeg_path)
            .args(Self::args(input, output))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(RemuxError::Spawn)?;

        if !result.status.success() {
            return Err(RemuxError::Failed {
                status: result.status.code(),
                stderr: stderr_excerpt(&result.stderr),
            });
        }

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Fast-start remux completed"
        );
        Ok(())
    }
}
