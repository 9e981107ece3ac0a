use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use super::api_path;
use super::auth::TestUser;

pub const LANDSCAPE_MAGIC: &[u8] = b"LANDSCAPE";
pub const PORTRAIT_MAGIC: &[u8] = b"PORTRAIT";
pub const SQUARE_MAGIC: &[u8] = b"SQUARE";

/// Fake MP4 bytes that the test prober reads as `magic` geometry.
pub fn video_bytes(magic: &[u8], len: usize) -> Vec<u8> {
    let mut data = magic.to_vec();
    data.resize(len.max(magic.len()), 0xAB);
    data
}

pub fn video_form(data: Vec<u8>, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name("boots.mp4")
        .mime_type(mime_type);
    MultipartForm::new().add_part("video", part)
}

pub fn thumbnail_form(data: Vec<u8>, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name("thumb.png")
        .mime_type(mime_type);
    MultipartForm::new().add_part("thumbnail", part)
}

/// Create a draft video owned by `user` and return its id.
pub async fn create_video(client: &TestServer, user: &TestUser, title: &str) -> Uuid {
    let response = client
        .post(&api_path("/videos"))
        .add_header("Authorization", user.bearer())
        .json(&json!({ "title": title, "description": "integration test" }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    Uuid::parse_str(body["id"].as_str().expect("Expected 'id' in response"))
        .expect("Invalid UUID in response")
}
