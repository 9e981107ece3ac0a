//! Video record handlers

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::services::sign_video;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tubely_core::models::{CreateVideoRequest, Video};
use tubely_core::AppError;
use uuid::Uuid;

/// Load a record and check that `user` owns it.
pub(crate) async fn load_owned_video(
    state: &AppState,
    video_id: Uuid,
    user: AuthUser,
) -> Result<Video, HttpAppError> {
    let video = state
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

    if !video.is_owned_by(user.user_id) {
        tracing::debug!(video_id = %video_id, user_id = %user.user_id, "Ownership check failed");
        return Err(AppError::Forbidden("Not authorized to modify this video".to_string()).into());
    }
    Ok(video)
}

pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateVideoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Video>), HttpAppError> {
    let Json(request) = payload?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()).into());
    }

    let video = state
        .videos
        .create(user.user_id, title, &request.description)
        .await?;

    tracing::info!(video_id = %video.id, user_id = %user.user_id, "Video draft created");
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Video>>, HttpAppError> {
    let videos = state.videos.list_for_user(user.user_id).await?;

    let mut signed = Vec::with_capacity(videos.len());
    for video in videos {
        signed.push(sign_video(state.storage.as_ref(), video, state.config.presign_expiry()).await?);
    }
    Ok(Json(signed))
}

pub async fn get_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<Json<Video>, HttpAppError> {
    let video = load_owned_video(&state, video_id, user).await?;
    let video = sign_video(state.storage.as_ref(), video, state.config.presign_expiry()).await?;
    Ok(Json(video))
}
