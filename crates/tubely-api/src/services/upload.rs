//! Multipart intake for video and thumbnail uploads.
//!
//! Content type is checked from the part headers before anything is written, and size is
//! enforced while the body streams in, so oversized uploads never reach the pipeline.

use crate::error::HttpAppError;
use axum::extract::multipart::Multipart;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tubely_core::models::Thumbnail;
use tubely_core::AppError;
use tubely_processing::{LocalArtifact, UploadValidator, ValidationError};

/// Stream the `name` part of `multipart` into a new artifact under `temp_root`.
///
/// The artifact exists from the first written byte; any early return drops it and removes the
/// partial file.
pub async fn receive_video_field(
    multipart: &mut Multipart,
    name: &str,
    validator: &UploadValidator,
    temp_root: &Path,
) -> Result<(LocalArtifact, u64), HttpAppError> {
    // Skip unrelated parts; a field borrows the multipart, so this stays inline.
    let mut field = loop {
        match multipart.next_field().await? {
            Some(field) if field.name() == Some(name) => break field,
            Some(_) => continue,
            None => return Err(ValidationError::MissingField(name.to_string()).into()),
        }
    };
    validator.validate_content_type(field.content_type())?;

    tokio::fs::create_dir_all(temp_root)
        .await
        .map_err(AppError::from)?;

    let artifact = LocalArtifact::allocate(temp_root, "mp4");
    let mut file = tokio::fs::File::create(artifact.path())
        .await
        .map_err(AppError::from)?;

    let mut received: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        received += chunk.len() as u64;
        validator.validate_size(received)?;
        file.write_all(&chunk).await.map_err(AppError::from)?;
    }
    file.flush().await.map_err(AppError::from)?;
    file.sync_all().await.map_err(AppError::from)?;
    drop(file);

    validator.validate_received(received)?;

    tracing::debug!(
        path = %artifact.path().display(),
        size_bytes = received,
        "Upload received"
    );

    Ok((artifact, received))
}

/// Read the `name` part of `multipart` into memory as a thumbnail.
pub async fn read_thumbnail_field(
    multipart: &mut Multipart,
    name: &str,
    validator: &UploadValidator,
) -> Result<Thumbnail, HttpAppError> {
    let mut field = loop {
        match multipart.next_field().await? {
            Some(field) if field.name() == Some(name) => break field,
            Some(_) => continue,
            None => return Err(ValidationError::MissingField(name.to_string()).into()),
        }
    };
    let media_type = validator.validate_content_type(field.content_type())?;

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        validator.validate_size((data.len() + chunk.len()) as u64)?;
        data.extend_from_slice(&chunk);
    }
    validator.validate_received(data.len() as u64)?;

    Ok(Thumbnail::new(data, media_type))
}
