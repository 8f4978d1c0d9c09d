//! YOLO sign model executed with rten.
//!
//! The network is treated as a black box: a letterboxed RGB tensor goes in and
//! a `[1, 4 + classes, anchors]` prediction tensor comes out. Decoding and
//! non-maximum suppression turn that into [`RawDetection`]s in source image
//! coordinates.

use std::path::Path;

use anyhow::{Result, anyhow};
use image::RgbImage;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use tracing::{debug, info};

use crate::detection::SignDetector;
use crate::detection::preprocessing::{letterbox, normalize_to_chw};
use crate::error::StartupError;
use crate::models::RawDetection;

/// Square input edge the model was exported with
pub const INPUT_SIZE: u32 = 640;
/// Candidates below this score never leave the model
pub const SCORE_FLOOR: f32 = 0.25;
pub const IOU_THRESHOLD: f32 = 0.7;

pub struct YoloSignModel {
    model: Model,
    input_size: u32,
    score_floor: f32,
    iou_threshold: f32,
}

impl YoloSignModel {
    /// Load weights from disk. Any failure here is fatal to startup.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            return Err(StartupError::ModelLoad {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let model = Model::load_file(path).map_err(|e| StartupError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!("Sign model loaded from {}", path.display());

        Ok(Self {
            model,
            input_size: INPUT_SIZE,
            score_floor: SCORE_FLOOR,
            iou_threshold: IOU_THRESHOLD,
        })
    }
}

impl SignDetector for YoloSignModel {
    fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>> {
        let size = self.input_size;
        let boxed = letterbox(image, (size, size));
        let data = normalize_to_chw(&boxed.image, (size, size));
        let input = NdTensor::from_data([1, 3, size as usize, size as usize], data);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| anyhow!("Sign model inference failed: {}", e))?;
        let output: NdTensor<f32, 3> = output
            .try_into()
            .map_err(|e| anyhow!("Unexpected sign model output: {}", e))?;

        let shape = output.shape();
        let candidates = decode_predictions(&output.to_vec(), shape, self.score_floor);
        let kept = non_max_suppression(candidates, self.iou_threshold);
        debug!("Sign model kept {} of its candidates", kept.len());

        Ok(kept
            .into_iter()
            .map(|det| RawDetection {
                corners: boxed.to_source(det.corners),
                ..det
            })
            .collect())
    }
}

/// Decode a `[1, 4 + classes, anchors]` (or transposed `[1, anchors, 4 + classes]`)
/// prediction tensor into corner boxes in model input space. Each anchor
/// contributes at most one candidate: its best scoring class.
pub fn decode_predictions(data: &[f32], shape: [usize; 3], score_floor: f32) -> Vec<RawDetection> {
    let (rows, cols) = (shape[1], shape[2]);
    if rows * cols == 0 || data.len() < rows * cols {
        return Vec::new();
    }

    // exported models put the short attribute axis first
    let attributes_first = rows <= cols;
    let (attributes, anchors) = if attributes_first { (rows, cols) } else { (cols, rows) };
    if attributes <= 4 {
        return Vec::new();
    }

    let value = |attribute: usize, anchor: usize| {
        if attributes_first {
            data[attribute * anchors + anchor]
        } else {
            data[anchor * attributes + attribute]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (4..attributes)
            .map(|attribute| (attribute - 4, value(attribute, anchor)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < score_floor {
            continue;
        }

        let (cx, cy) = (value(0, anchor), value(1, anchor));
        let (w, h) = (value(2, anchor), value(3, anchor));
        candidates.push(RawDetection::new(
            [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            score,
            class_id as i64,
        ));
    }

    candidates
}

/// Intersection over union of two corner boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let width = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let height = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = width * height;

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - intersection;
    if union <= 0.0 { 0.0 } else { intersection / union }
}

/// Greedy per-class suppression. Output is sorted by descending confidence.
pub fn non_max_suppression(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.corners, &candidate.corners) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
