//! Thumbnail upload and serving

use crate::auth::AuthUser;
use crate::constants::{API_PREFIX, THUMBNAIL_FIELD};
use crate::error::HttpAppError;
use crate::handlers::videos::load_owned_video;
use crate::services::{read_thumbnail_field, sign_video};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tubely_core::models::Video;
use tubely_core::AppError;
use uuid::Uuid;

pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
    let video = load_owned_video(&state, video_id, user).await?;

    let thumbnail =
        read_thumbnail_field(&mut multipart, THUMBNAIL_FIELD, &state.thumbnail_validator).await?;
    let size = thumbnail.len();
    state.thumbnails.put(video.id, thumbnail).await;

    let url = format!("{}/thumbnails/{}", API_PREFIX, video.id);
    let updated = state.videos.set_thumbnail_url(video.id, &url).await?;
    tracing::info!(video_id = %video.id, size_bytes = size, "Thumbnail stored");

    let signed = sign_video(state.storage.as_ref(), updated, state.config.presign_expiry()).await?;
    Ok(Json(signed))
}

pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let thumbnail = state
        .thumbnails
        .get(video_id)
        .await
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, thumbnail.media_type.as_str())
        .header(header::CACHE_CONTROL, "no-store")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::from(thumbnail.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
