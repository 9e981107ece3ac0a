//! Upload pipeline: probe → classify → remux → upload → cleanup.
//!
//! [`UploadPipeline::run`] takes ownership of the received file and does not return until every
//! local artifact of the invocation has been removed, whatever the outcome. The storage key it
//! returns refers to an object the store has already accepted; persisting that key is left to
//! the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::timeout;
use tubely_core::models::GeometryCategory;
use tubely_core::Config;
use tubely_storage::{video_key, Storage, StorageError};

use crate::artifact::{ArtifactSet, LocalArtifact};
use crate::error::{PipelineError, ProbeError, RemuxError};
use crate::geometry::Geometry;
use crate::prober::MediaProber;
use crate::remuxer::{processed_path, Remuxer};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Content type recorded on the stored object.
    pub content_type: String,
    pub probe_timeout: Duration,
    pub remux_timeout: Duration,
    pub upload_timeout: Duration,
    /// Compare the stored object's size with the local file before cleanup.
    pub verify_uploads: bool,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            content_type: config.media.video_content_type.clone(),
            probe_timeout: config.probe_timeout(),
            remux_timeout: config.remux_timeout(),
            upload_timeout: config.upload_timeout(),
            verify_uploads: config.media.verify_uploads,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content_type: tubely_core::constants::VIDEO_MP4.to_string(),
            probe_timeout: Duration::from_secs(30),
            remux_timeout: Duration::from_secs(300),
            upload_timeout: Duration::from_secs(600),
            verify_uploads: true,
        }
    }
}

/// Result of a committed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Unsigned storage key, `{category}/{id}.mp4`.
    pub key: String,
    pub category: GeometryCategory,
    pub geometry: Geometry,
}

pub struct UploadPipeline {
    prober: Arc<dyn MediaProber>,
    remuxer: Arc<dyn Remuxer>,
    storage: Arc<dyn Storage>,
    config: PipelineConfig,
}

impl UploadPipeline {
    pub fn new(
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn Remuxer>,
        storage: Arc<dyn Storage>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            prober,
            remuxer,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one received upload. Cleanup runs exactly once, after the last stage.
    #[tracing::instrument(skip_all, fields(path = %received.path().display()))]
    pub async fn run(&self, received: LocalArtifact) -> Result<UploadOutcome, PipelineError> {
        let start = Instant::now();
        let mut artifacts = ArtifactSet::new();
        let input = artifacts.register(received);

        let result = self.process(&input, &mut artifacts).await;

        let artifact_count = artifacts.len();
        for err in artifacts.release_all().await {
            tracing::warn!(
                path = %err.path.display(),
                error = %err.source,
                "Failed to remove temporary artifact"
            );
        }
        tracing::debug!(artifacts = artifact_count, "Temporary artifacts cleaned up");

        match &result {
            Ok(outcome) => tracing::info!(
                key = %outcome.key,
                category = %outcome.category,
                width = outcome.geometry.width,
                height = outcome.geometry.height,
                duration_ms = start.elapsed().as_millis() as u64,
                "Video upload pipeline committed"
            ),
            Err(err) => tracing::error!(
                stage = err.stage(),
                error = %err,
                duration_ms = start.elapsed().as_millis() as u64,
                "Video upload pipeline failed"
            ),
        }

        result
    }

    async fn process(
        &self,
        input: &Path,
        artifacts: &mut ArtifactSet,
    ) -> Result<UploadOutcome, PipelineError> {
        let probe_timeout = self.config.probe_timeout;
        let geometry = timeout(probe_timeout, self.prober.probe(input))
            .await
            .map_err(|_| ProbeError::Timeout(probe_timeout))??;
        let category = geometry.category();
        tracing::debug!(
            stage = "probe",
            width = geometry.width,
            height = geometry.height,
            category = %category,
            "Video probed"
        );

        // Registered before the remuxer runs so partial output is removed too.
        let output = artifacts.register(LocalArtifact::adopt(processed_path(input)));
        let remux_timeout = self.config.remux_timeout;
        timeout(remux_timeout, self.remuxer.remux(input, &output))
            .await
            .map_err(|_| RemuxError::Timeout(remux_timeout))??;
        tracing::debug!(stage = "remux", output = %output.display(), "Video remuxed");

        let key = video_key(category);
        let upload_timeout = self.config.upload_timeout;
        timeout(
            upload_timeout,
            self.storage
                .upload_file(&output, &key, &self.config.content_type),
        )
        .await
        .map_err(|_| PipelineError::UploadTimeout(upload_timeout))??;
        tracing::debug!(stage = "upload", key = %key, "Video uploaded");

        if self.config.verify_uploads {
            // An unverified object is never referenced by a record.
            if let Err(e) = self.verify_upload(&output, &key).await {
                if let Err(delete_err) = self.storage.delete(&key).await {
                    tracing::warn!(
                        key = %key,
                        error = %delete_err,
                        "Failed to delete unverified object"
                    );
                }
                return Err(e);
            }
        }

        Ok(UploadOutcome {
            key,
            category,
            geometry,
        })
    }

    async fn verify_upload(&self, local: &Path, key: &str) -> Result<(), PipelineError> {
        let expected = tokio::fs::metadata(local)
            .await
            .map_err(StorageError::IoError)?
            .len();
        let actual = self.storage.content_length(key).await?;

        if expected != actual {
            return Err(PipelineError::IntegrityMismatch {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
