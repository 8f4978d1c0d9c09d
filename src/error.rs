//! Error types for aqroad

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort startup and are shown to the user.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Failed to load sign model from {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Failed to start {0} thread: {1}")]
    Thread(&'static str, #[source] std::io::Error),
}

/// A single frame could not be read. Always recoverable.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("No frame available: {0}")]
    Unavailable(String),

    #[error("Frame decode failed: {0}")]
    Decode(String),
}

/// Speech engine failures. Contained by the speech worker.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Speech engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
