pub mod catalog;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod presentation;
pub mod slot;
pub mod speech;

#[cfg(feature = "camera")]
pub mod camera;

#[cfg(feature = "gui")]
pub mod gui;

pub use catalog::{SignCatalog, SignInfo};
pub use config::AppConfig;
pub use detection::{DetectionGateway, SignDetector};
pub use error::{FrameError, SpeechError, StartupError};
pub use models::{BoundingBox, Detection, FramePacket, RawDetection};
pub use pipeline::{CaptureHandle, CaptureLoop, FrameSource, PipelineContext, StepOutcome};
pub use presentation::{PresentationController, SignLabels, ViewState};
pub use slot::FrameSlot;
pub use speech::{RequestOutcome, SpeechDispatcher, SpeechEngine, SpeechStats};
