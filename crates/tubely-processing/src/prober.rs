//! Frame geometry extraction with ffprobe.

use crate::error::ProbeError;
use crate::geometry::Geometry;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Longest stderr excerpt carried in an error.
pub(crate) const MAX_STDERR_LEN: usize = 2048;

/// Reads the geometry of the first video stream of a local file without modifying it.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<Geometry, ProbeError>;
}

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffprobe_path,
        path = %path.display()
    ))]
    async fn probe(&self, path: &Path) -> Result<Geometry, ProbeError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(Self::args(path))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status.code(),
                stderr: stderr_excerpt(&output.stderr),
            });
        }

        let geometry = parse_probe_output(&output.stdout)?;

        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            duration_ms = start.elapsed().as_millis() as u64,
            "Video probe completed"
        );

        Ok(geometry)
    }
}

/// Extract width and height of the first stream from ffprobe's JSON output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<Geometry, ProbeError> {
    let probe_data: serde_json::Value =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;

    let stream = probe_data["streams"]
        .get(0)
        .ok_or(ProbeError::NoVideoStream)?;

    let width = stream["width"].as_u64().unwrap_or(0);
    let height = stream["height"].as_u64().unwrap_or(0);

    if width == 0 || height == 0 || width > u32::MAX as u64 || height > u32::MAX as u64 {
        return Err(ProbeError::InvalidDimensions { width, height });
    }

    Ok(Geometry::new(width as u32, height as u32))
}

/// Lossy, trimmed tail of a process's stderr.
pub(crate) fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= MAX_STDERR_LEN {
        return text.to_string();
    }
    let mut start = text.len() - MAX_STDERR_LEN;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
