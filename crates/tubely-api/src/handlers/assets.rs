//! Presigned object serving for the local storage backend.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tubely_core::constants::VIDEO_MP4;
use tubely_core::AppError;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    expires: Option<i64>,
    signature: Option<String>,
}

/// `GET /assets/{*key}?expires=&signature=`
pub async fn serve_asset(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, HttpAppError> {
    let local = state
        .local_assets
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
        return Err(AppError::Forbidden("Missing signature".to_string()).into());
    };
    local.verify_presigned(&key, expires, signature, Utc::now())?;

    let (file, len) = local.open(&key).await?;
    let content_type = if key.ends_with(".mp4") {
        VIDEO_MP4
    } else {
        "application/octet-stream"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
