#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from aqroad for tests
pub use aqroad::{
    AppConfig, BoundingBox, CaptureHandle, CaptureLoop, Detection, DetectionGateway, FramePacket,
    FrameSlot, PipelineContext, PresentationController, RawDetection, RequestOutcome, SignCatalog,
    SpeechDispatcher, StepOutcome,
};
