//! Temporary file ownership for one pipeline invocation.
//!
//! Every file the pipeline touches on local disk is held by a [`LocalArtifact`]. Releasing the
//! guard removes the file asynchronously; if the guard is dropped without being released (early
//! return, panic, cancelled request future) the file is removed synchronously in `Drop`.

use crate::error::CleanupError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug)]
pub struct LocalArtifact {
    path: PathBuf,
    released: bool,
}

impl LocalArtifact {
    /// Reserve a fresh `<uuid>.<extension>` path under `root`. The file itself is not created.
    pub fn allocate(root: &Path, extension: &str) -> Self {
        let name = format!("{}.{}", Uuid::new_v4().simple(), extension);
        Self::adopt(root.join(name))
    }

    /// Take ownership of `path`, whether or not it exists yet.
    pub fn adopt(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file. A file that was never created counts as removed.
    pub async fn release(mut self) -> Result<(), CleanupError> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CleanupError {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for LocalArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed unreleased artifact");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove unreleased artifact"
                );
            }
        }
    }
}

/// All artifacts of one invocation, released together exactly once.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<LocalArtifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `artifact` and return its path.
    pub fn register(&mut self, artifact: LocalArtifact) -> PathBuf {
        let path = artifact.path.clone();
        self.artifacts.push(artifact);
        path
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Release every artifact independently; one failure does not stop the others.
    pub async fn release_all(self) -> Vec<CleanupError> {
        let mut errors = Vec::new();
        for artifact in self.artifacts {
            if let Err(e) = artifact.release().await {
                errors.push(e);
            }
        }
        errors
    }
}
