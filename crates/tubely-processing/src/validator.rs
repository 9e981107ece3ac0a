/// Upload rejections raised before any processing starts.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {content_type} (expected: {expected})")]
    InvalidContentType {
        content_type: String,
        expected: String,
    },

    #[error("Empty file")]
    EmptyFile,

    #[error("Missing form field: {0}")]
    MissingField(String),
}

/// Raster formats accepted as thumbnails. Scriptable types such as `image/svg+xml` are excluded.
pub const THUMBNAIL_CONTENT_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/webp", "image/gif"];

#[derive(Debug, Clone)]
enum ContentTypeRule {
    Exact(String),
    OneOf(Vec<String>),
}

/// Size and content type checks for one kind of upload.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_size: u64,
    rule: ContentTypeRule,
}

impl UploadValidator {
    /// Accept exactly `content_type` (e.g. `video/mp4`) up to `max_size` bytes.
    pub fn video(max_size: u64, content_type: &str) -> Self {
        Self {
            max_size,
            rule: ContentTypeRule::Exact(content_type.to_lowercase()),
        }
    }

    /// Accept the raster types in [`THUMBNAIL_CONTENT_TYPES`] up to `max_size` bytes.
    pub fn image(max_size: u64) -> Self {
        Self {
            max_size,
            rule: ContentTypeRule::OneOf(
                THUMBNAIL_CONTENT_TYPES.iter().map(|t| t.to_string()).collect(),
            ),
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Check a declared content type, ignoring parameters such as `; codecs=...`.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<String, ValidationError> {
        let declared = content_type.unwrap_or("");
        let essence = declared
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        let ok = match &self.rule {
            ContentTypeRule::Exact(expected) => &essence == expected,
            ContentTypeRule::OneOf(allowed) => allowed.contains(&essence),
        };

        if !ok {
            let expected = match &self.rule {
                ContentTypeRule::Exact(expected) => expected.clone(),
                ContentTypeRule::OneOf(allowed) => allowed.join(", "),
            };
            return Err(ValidationError::InvalidContentType {
                content_type: declared.to_string(),
                expected,
            });
        }

        Ok(essence)
    }

    /// Check a size, either declared up front or counted while receiving.
    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Final check once the whole body was received.
    pub fn validate_received(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        self.validate_size(size)
    }
}
