use std::sync::Arc;

use image::RgbImage;

/// Corners from the detector are clamped to +/- this many pixels
pub const COORD_LIMIT: i32 = 1 << 24;

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Truncates floating point corners the same way the model reports them,
    /// clamped to `COORD_LIMIT`. NaN becomes 0.
    pub fn from_corners(corners: [f32; 4]) -> Self {
        let coord = |v: f32| (v as i32).clamp(-COORD_LIMIT, COORD_LIMIT);
        Self {
            left: coord(corners[0]),
            top: coord(corners[1]),
            right: coord(corners[2]),
            bottom: coord(corners[3]),
        }
    }

    pub fn width(&self) -> i32 {
        span(self.left, self.right)
    }

    pub fn height(&self) -> i32 {
        span(self.top, self.bottom)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn center(&self) -> (i32, i32) {
        let mid = |a: i32, b: i32| ((a as i64 + b as i64) / 2) as i32;
        (mid(self.left, self.right), mid(self.top, self.bottom))
    }
}

/// Non-negative distance from `from` to `to`, saturating at `i32::MAX`
fn span(from: i32, to: i32) -> i32 {
    (to as i64 - from as i64).clamp(0, i32::MAX as i64) as i32
}

/// One unfiltered result straight out of the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// left, top, right, bottom
    pub corners: [f32; 4],
    pub confidence: f32,
    pub class_id: i64,
}

impl RawDetection {
    pub fn new(corners: [f32; 4], confidence: f32, class_id: i64) -> Self {
        Self {
            corners,
            confidence,
            class_id,
        }
    }
}

/// A recognized road sign in a single frame.
///
/// Fields are read-only once built; a detection either lives for one frame
/// cycle or, when the view is frozen, until capture resumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    bbox: BoundingBox,
    name: String,
    description: String,
    confidence: f32,
}

impl Detection {
    pub fn new(
        bbox: BoundingBox,
        name: impl Into<String>,
        description: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            bbox,
            name: name.into(),
            description: description.into(),
            confidence,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Overlay caption, e.g. `Stop (0.91)`
    pub fn label(&self) -> String {
        format!("{} ({:.2})", self.name, self.confidence)
    }

    /// Sentence handed to the speech engine
    pub fn announcement(&self) -> String {
        format!("Detected {}. {}", self.name, self.description)
    }
}

/// A rendered frame paired with its best detection, as handed from the
/// capture thread to the presentation side.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub frame: Arc<RgbImage>,
    pub detection: Option<Detection>,
}

impl FramePacket {
    pub fn new(frame: RgbImage, detection: Option<Detection>) -> Self {
        Self {
            frame: Arc::new(frame),
            detection,
        }
    }
}
