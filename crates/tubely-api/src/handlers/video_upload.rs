use crate::auth::AuthUser;
use crate::constants::{MULTIPART_OVERHEAD_BYTES, VIDEO_FIELD};
use crate::error::HttpAppError;
use crate::handlers::videos::load_owned_video;
use crate::services::{receive_video_field, sign_video};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{header::CONTENT_LENGTH, HeaderMap},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tubely_core::models::Video;
use uuid::Uuid;

/// `POST /api/videos/{id}/upload`
///
/// Receives the `video` part into the temp root, runs the upload pipeline, then records the
/// storage key. The response carries a presigned URL in place of the key.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
    let start = Instant::now();
    let video = load_owned_video(&state, video_id, user).await?;

    // Reject from the declared length before reading the body at all.
    if let Some(declared) = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        state
            .video_validator
            .validate_size(declared.saturating_sub(MULTIPART_OVERHEAD_BYTES))?;
    }

    let (artifact, size) = receive_video_field(
        &mut multipart,
        VIDEO_FIELD,
        &state.video_validator,
        &state.config.media.temp_root,
    )
    .await?;

    tracing::info!(video_id = %video_id, size_bytes = size, "Processing video upload");
    let outcome = state.pipeline.run(artifact).await?;

    let updated = match state.videos.set_video_url(video.id, &outcome.key).await {
        Ok(updated) => updated,
        Err(e) => {
            // The object is orphaned without its record.
            let storage = state.storage.clone();
            let key = outcome.key.clone();
            tokio::spawn(async move {
                if let Err(cleanup_err) = storage.delete(&key).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        storage_key = %key,
                        "Failed to cleanup storage object after DB error"
                    );
                }
            });
            return Err(e.into());
        }
    };

    tracing::info!(
        video_id = %video_id,
        key = %outcome.key,
        category = %outcome.category,
        duration_ms = start.elapsed().as_millis() as u64,
        "Video upload complete"
    );

    let signed = sign_video(state.storage.as_ref(), updated, state.config.presign_expiry()).await?;
    Ok(Json(signed))
}
