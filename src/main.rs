use std::sync::Arc;

use anyhow::Context;
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use aqroad::camera::NokhwaCamera;
use aqroad::detection::{DetectionGateway, YoloSignModel};
use aqroad::error::StartupError;
use aqroad::speech::{CommandSpeechEngine, MissingSpeechEngine, SpeechDispatcher, SpeechEngine};
use aqroad::{AppConfig, CaptureHandle, PipelineContext, SignCatalog};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();

    let model = match YoloSignModel::load(&config.model_path) {
        Ok(model) => model,
        Err(e) => return Err(fatal("Model Error", e)),
    };
    let gateway = DetectionGateway::new(model, Arc::new(SignCatalog::gtsrb()))
        .with_threshold(config.confidence_threshold);

    let engine: Box<dyn SpeechEngine> = match CommandSpeechEngine::detect() {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            warn!("Read-aloud disabled: {}", e);
            Box::new(MissingSpeechEngine::new(e.to_string()))
        }
    };
    let speech = Arc::new(
        SpeechDispatcher::start(engine, config.speech_queue_capacity)
            .context("Failed to start speech worker")?,
    );

    let context = Arc::new(PipelineContext::new());
    let (camera_index, resolution) = (config.camera_index, config.camera_resolution);
    let mut capture = match CaptureHandle::spawn(
        move || NokhwaCamera::open(camera_index, resolution),
        gateway,
        context.clone(),
    ) {
        Ok(capture) => capture,
        Err(e) => {
            speech.shutdown(config.speech_shutdown_timeout);
            return Err(fatal("Camera Error", e));
        }
    };

    let video_size = capture.resolution();
    let result = aqroad::gui::run(config.clone(), context, speech.clone(), video_size);

    info!("Window closed, shutting down");
    capture.shutdown(config.capture_shutdown_timeout);
    speech.shutdown(config.speech_shutdown_timeout);

    result.context("GUI terminated with an error")
}

/// Show the startup failure to the user and turn it into the exit error.
fn fatal(title: &str, e: StartupError) -> anyhow::Error {
    error!("{}", e);

    let description = match &e {
        StartupError::CameraUnavailable(_) => "No camera detected or unable to access camera.".to_string(),
        other => other.to_string(),
    };

    let _ = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();

    anyhow::Error::new(e)
}
