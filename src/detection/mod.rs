pub mod model;
pub mod overlay;
pub mod preprocessing;

use std::sync::Arc;

use image::RgbImage;

use crate::catalog::SignCatalog;
use crate::models::{BoundingBox, Detection, RawDetection};

pub use model::YoloSignModel;

/// Confidence a raw detection has to strictly exceed to be reported
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Opaque object detector: one image in, unfiltered detections out.
pub trait SignDetector: Send + Sync {
    fn infer(&self, image: &RgbImage) -> anyhow::Result<Vec<RawDetection>>;
}

impl<D: SignDetector + ?Sized> SignDetector for Box<D> {
    fn infer(&self, image: &RgbImage) -> anyhow::Result<Vec<RawDetection>> {
        (**self).infer(image)
    }
}

impl<D: SignDetector + ?Sized> SignDetector for Arc<D> {
    fn infer(&self, image: &RgbImage) -> anyhow::Result<Vec<RawDetection>> {
        (**self).infer(image)
    }
}

/// Runs the detector, drops low-confidence results and attaches catalog
/// names and descriptions.
pub struct DetectionGateway {
    detector: Box<dyn SignDetector>,
    catalog: Arc<SignCatalog>,
    threshold: f32,
}

impl DetectionGateway {
    pub fn new(detector: impl SignDetector + 'static, catalog: Arc<SignCatalog>) -> Self {
        Self {
            detector: Box::new(detector),
            catalog,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn catalog(&self) -> &SignCatalog {
        &self.catalog
    }

    /// Detect signs in `image`. An empty vector means nothing cleared the
    /// threshold; an error means the detector itself failed.
    pub fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        let raw = self.detector.infer(image)?;

        Ok(raw
            .into_iter()
            .filter(|det| det.confidence > self.threshold)
            .map(|det| {
                let info = self.catalog.lookup(det.class_id);
                Detection::new(
                    BoundingBox::from_corners(det.corners),
                    info.name.clone(),
                    info.description.clone(),
                    det.confidence,
                )
            })
            .collect())
    }

    /// Annotated copy of `image`; the input is left untouched.
    pub fn render(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        overlay::draw_detections(image, detections)
    }
}

/// Highest-confidence detection, if any. No smoothing across frames.
pub fn best_detection(detections: &[Detection]) -> Option<Detection> {
    detections
        .iter()
        .max_by(|a, b| a.confidence().total_cmp(&b.confidence()))
        .cloned()
}
