use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Orientation bucket of an uploaded video, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryCategory {
    Portrait,
    Landscape,
    /// Square frames.
    Other,
}

impl GeometryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryCategory::Portrait => "portrait",
            GeometryCategory::Landscape => "landscape",
            GeometryCategory::Other => "other",
        }
    }
}

impl Display for GeometryCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A persisted video record.
///
/// `video_url` holds the unsigned storage key at rest; it is turned into a presigned URL
/// every time the record is returned to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Body of `POST /api/videos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_matches_key_prefix() {
        assert_eq!(GeometryCategory::Portrait.to_string(), "portrait");
        assert_eq!(GeometryCategory::Landscape.to_string(), "landscape");
        assert_eq!(GeometryCategory::Other.to_string(), "other");
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&GeometryCategory::Landscape).unwrap();
        assert_eq!(json, "\"landscape\"");
    }

    #[test]
    fn test_create_request_description_defaults_to_empty() {
        let req: CreateVideoRequest = serde_json::from_str(r#"{"title":"Boots"}"#).unwrap();
        assert_eq!(req.title, "Boots");
        assert!(req.description.is_empty());
    }
}
