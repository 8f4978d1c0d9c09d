//! UI-side state: what the window shows and what the two buttons do.
//!
//! The controller is driven by a periodic tick from whatever front-end hosts
//! it. It never touches the camera or the detector; it only drains the
//! handoff slot and reads the current-detection reference.

use std::sync::Arc;

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::models::{Detection, FramePacket};
use crate::pipeline::PipelineContext;
use crate::speech::{RequestOutcome, SpeechDispatcher};

pub const NO_SIGN_NAME: &str = "No signs detected";
pub const NO_SIGN_DESCRIPTION: &str = "No sign detected";
pub const NO_CONFIDENCE: &str = "N/A";

pub const CAPTURE_CAPTION: &str = "Capture Frame";
pub const RESUME_CAPTION: &str = "Resume Live";

/// Text shown in the sign, description and confidence fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignLabels {
    pub name: String,
    pub description: String,
    pub confidence: String,
}

impl SignLabels {
    pub fn placeholder() -> Self {
        Self {
            name: NO_SIGN_NAME.to_string(),
            description: NO_SIGN_DESCRIPTION.to_string(),
            confidence: NO_CONFIDENCE.to_string(),
        }
    }

    pub fn from_detection(detection: &Detection) -> Self {
        Self {
            name: detection.name().to_string(),
            description: detection.description().to_string(),
            confidence: format!("{:.2}", detection.confidence()),
        }
    }
}

impl Default for SignLabels {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    /// Last frame put on the canvas; stays until a newer one arrives
    pub frame: Option<Arc<RgbImage>>,
    /// Bumped whenever `frame` changes
    pub frame_revision: u64,
    pub labels: SignLabels,
    pub speak_enabled: bool,
    pub frozen: bool,
}

impl ViewState {
    pub fn capture_caption(&self) -> &'static str {
        if self.frozen { RESUME_CAPTION } else { CAPTURE_CAPTION }
    }
}

pub struct PresentationController {
    context: Arc<PipelineContext>,
    speech: Arc<SpeechDispatcher>,
    snapshot: Option<FramePacket>,
    view: ViewState,
}

impl PresentationController {
    pub fn new(context: Arc<PipelineContext>, speech: Arc<SpeechDispatcher>) -> Self {
        let speak_enabled = context.current_detection().is_some();
        let frozen = context.is_frozen();

        Self {
            context,
            speech,
            snapshot: None,
            view: ViewState {
                frame: None,
                frame_revision: 0,
                labels: SignLabels::placeholder(),
                speak_enabled,
                frozen,
            },
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn is_frozen(&self) -> bool {
        self.view.frozen
    }

    /// Detection held by the frozen snapshot, if any
    pub fn frozen_detection(&self) -> Option<&Detection> {
        self.snapshot.as_ref().and_then(|packet| packet.detection.as_ref())
    }

    /// Refresh from the snapshot (frozen) or the handoff slot (live).
    /// Returns false when live and no new frame was waiting; the view is
    /// then left exactly as it was.
    pub fn tick(&mut self) -> bool {
        let (frame, detection) = if self.view.frozen {
            match &self.snapshot {
                Some(packet) => (Some(packet.frame.clone()), packet.detection.clone()),
                None => (None, None),
            }
        } else {
            match self.context.take_frame() {
                Some(packet) => (Some(packet.frame), packet.detection),
                None => return false,
            }
        };

        if let Some(frame) = frame {
            self.show_frame(frame);
        }
        self.show_detection(detection.as_ref());
        true
    }

    /// Freeze on the waiting frame, or go back to live video.
    pub fn toggle_capture(&mut self) {
        if !self.view.frozen {
            self.view.frozen = true;
            self.context.set_frozen(true);

            if let Some(packet) = self.context.take_frame() {
                self.view.speak_enabled = packet.detection.is_some();
                self.snapshot = Some(packet);
            }
        } else {
            self.view.frozen = false;
            self.context.set_frozen(false);
            self.snapshot = None;
            self.view.speak_enabled = self.context.current_detection().is_some();
        }
    }

    /// Read the frozen or live detection aloud. Returns `None` when there is
    /// nothing to say, in which case the speech engine is not involved.
    pub fn speak_current(&self) -> Option<RequestOutcome> {
        let detection = if self.view.frozen {
            self.frozen_detection().cloned()
        } else {
            self.context.current_detection()
        };

        detection.map(|detection| self.speech.request(detection.announcement()))
    }

    fn show_frame(&mut self, frame: Arc<RgbImage>) {
        let unchanged = self
            .view
            .frame
            .as_ref()
            .is_some_and(|shown| Arc::ptr_eq(shown, &frame));
        if !unchanged {
            self.view.frame = Some(frame);
            self.view.frame_revision += 1;
        }
    }

    fn show_detection(&mut self, detection: Option<&Detection>) {
        match detection {
            Some(detection) => {
                self.view.labels = SignLabels::from_detection(detection);
                self.view.speak_enabled = true;
            }
            None => {
                self.view.labels = SignLabels::placeholder();
                // a frozen view keeps whatever its capture moment allowed
                if !self.view.frozen {
                    self.view.speak_enabled = false;
                }
            }
        }
    }
}

/// Scale `frame` to `width`, keeping its aspect ratio.
pub fn scale_to_width(frame: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = frame.dimensions();
    if w == 0 || w == width {
        return frame.clone();
    }
    let height = ((width as u64 * h as u64) / w as u64).max(1) as u32;
    imageops::resize(frame, width, height, FilterType::Triangle)
}
