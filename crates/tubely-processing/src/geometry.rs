use serde::Serialize;
use tubely_core::models::GeometryCategory;

/// Frame dimensions of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn category(&self) -> GeometryCategory {
        classify(self.width, self.height)
    }
}

/// Taller than wide is portrait, wider than tall is landscape, square is other.
pub fn classify(width: u32, height: u32) -> GeometryCategory {
    if height > width {
        GeometryCategory::Portrait
    } else if width > height {
        GeometryCategory::Landscape
    } else {
        GeometryCategory::Other
    }
}
