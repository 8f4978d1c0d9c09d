mod common;

use std::sync::Arc;
use std::time::Duration;

use aqroad::SpeechStats;
use aqroad::presentation::{
    CAPTURE_CAPTION, NO_CONFIDENCE, NO_SIGN_DESCRIPTION, NO_SIGN_NAME, RESUME_CAPTION, SignLabels,
    scale_to_width,
};
use common::*;

const WAIT: Duration = Duration::from_secs(5);

fn sign(name: &str, confidence: f32) -> Detection {
    Detection::new(
        BoundingBox::new(5, 5, 25, 25),
        name,
        format!("{} description.", name),
        confidence,
    )
}

fn setup() -> anyhow::Result<(Arc<PipelineContext>, Arc<SpeechDispatcher>, Arc<SpeechLog>)> {
    let (engine, log) = RecordingEngine::new(Duration::from_millis(1));
    let speech = Arc::new(SpeechDispatcher::start(engine, 4)?);
    Ok((Arc::new(PipelineContext::new()), speech, log))
}

#[test]
fn test_speak_without_detection_never_reaches_engine() -> anyhow::Result<()> {
    let (context, speech, log) = setup()?;
    let mut controller = PresentationController::new(context.clone(), speech.clone());

    assert_eq!(controller.speak_current(), None);

    context.publish(FramePacket::new(test_frame(8, 8), None));
    assert!(controller.tick());
    assert!(!controller.view().speak_enabled);
    assert_eq!(controller.speak_current(), None);

    controller.toggle_capture();
    assert_eq!(controller.speak_current(), None);

    assert!(speech.shutdown(WAIT));
    assert_eq!(log.len(), 0);
    assert_eq!(speech.stats(), SpeechStats::default());

    Ok(())
}

#[test]
fn test_resume_follows_live_detection() -> anyhow::Result<()> {
    let (context, speech, _log) = setup()?;
    let mut controller = PresentationController::new(context.clone(), speech.clone());

    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Stop", 0.9))));
    controller.toggle_capture();
    assert!(controller.is_frozen());
    assert!(controller.view().speak_enabled);
    assert_eq!(controller.frozen_detection().map(|d| d.name()), Some("Stop"));

    // a frame without a sign lands right as the view freezes
    context.publish(FramePacket::new(test_frame(8, 8), None));

    controller.toggle_capture();
    assert!(!controller.is_frozen());
    assert!(!controller.view().speak_enabled);
    assert!(controller.frozen_detection().is_none());

    // and the other way round
    context.publish(FramePacket::new(test_frame(8, 8), None));
    controller.toggle_capture();
    assert!(!controller.view().speak_enabled);
    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Yield", 0.7))));
    controller.toggle_capture();
    assert!(controller.view().speak_enabled);

    Ok(())
}

#[test]
fn test_freeze_pins_the_snapshot() -> anyhow::Result<()> {
    let (context, speech, log) = setup()?;
    let mut controller = PresentationController::new(context.clone(), speech.clone());

    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Stop", 0.91))));
    controller.toggle_capture();
    assert!(context.is_frozen());
    assert_eq!(controller.view().capture_caption(), RESUME_CAPTION);

    assert!(controller.tick());
    let revision = controller.view().frame_revision;
    assert_eq!(controller.view().labels.name, "Stop");
    assert_eq!(controller.view().labels.confidence, "0.91");

    // newer live data does not reach a frozen view
    context.publish(FramePacket::new(test_frame(16, 16), Some(sign("Yield", 0.8))));
    assert!(controller.tick());
    assert!(controller.tick());
    assert_eq!(controller.view().labels.name, "Stop");
    assert_eq!(controller.view().frame_revision, revision);
    assert_eq!(controller.view().frame.as_ref().map(|f| f.dimensions()), Some((8, 8)));
    assert!(context.has_pending_frame());

    assert_eq!(controller.speak_current(), Some(RequestOutcome::Queued));
    assert!(wait_until(WAIT, || log.len() == 1));
    assert_eq!(log.texts(), vec!["Detected Stop. Stop description."]);

    controller.toggle_capture();
    assert!(!context.is_frozen());
    assert_eq!(controller.view().capture_caption(), CAPTURE_CAPTION);

    assert!(controller.tick());
    assert_eq!(controller.view().labels.name, "Yield");
    assert!(controller.view().frame_revision > revision);

    assert!(speech.shutdown(WAIT));
    Ok(())
}

#[test]
fn test_empty_slot_leaves_view_untouched() -> anyhow::Result<()> {
    let (context, speech, _log) = setup()?;
    let mut controller = PresentationController::new(context.clone(), speech);

    assert!(!controller.tick());
    assert!(controller.view().frame.is_none());
    assert_eq!(controller.view().labels, SignLabels::placeholder());

    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Stop", 0.66))));
    assert!(controller.tick());
    let revision = controller.view().frame_revision;
    assert_eq!(revision, 1);

    assert!(!controller.tick());
    assert_eq!(controller.view().frame_revision, revision);
    assert_eq!(controller.view().labels.name, "Stop");
    assert_eq!(controller.view().labels.confidence, "0.66");
    assert!(controller.view().speak_enabled);

    Ok(())
}

#[test]
fn test_live_frame_without_sign_shows_placeholders() -> anyhow::Result<()> {
    let (context, speech, _log) = setup()?;
    let mut controller = PresentationController::new(context.clone(), speech);

    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Stop", 0.9))));
    controller.tick();
    context.publish(FramePacket::new(test_frame(8, 8), None));
    controller.tick();

    let labels = &controller.view().labels;
    assert_eq!(labels.name, NO_SIGN_NAME);
    assert_eq!(labels.description, NO_SIGN_DESCRIPTION);
    assert_eq!(labels.confidence, NO_CONFIDENCE);
    assert!(!controller.view().speak_enabled);

    Ok(())
}

#[test]
fn test_frozen_view_keeps_speak_enabled() -> anyhow::Result<()> {
    let (context, speech, _log) = setup()?;
    let mut controller = PresentationController::new(context.clone(), speech);

    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Stop", 0.9))));
    controller.tick();
    assert!(controller.view().speak_enabled);

    // nothing waiting in the slot, so there is no snapshot to show
    controller.toggle_capture();
    assert!(controller.frozen_detection().is_none());
    assert!(controller.tick());

    assert_eq!(controller.view().labels, SignLabels::placeholder());
    assert!(controller.view().speak_enabled);
    assert_eq!(controller.speak_current(), None);

    Ok(())
}

#[test]
fn test_live_speak_uses_current_detection() -> anyhow::Result<()> {
    let (context, speech, log) = setup()?;
    context.publish(FramePacket::new(test_frame(8, 8), Some(sign("Stop", 0.9))));

    let controller = PresentationController::new(context.clone(), speech.clone());
    assert!(controller.view().speak_enabled);

    // current detection is readable before the frame is consumed
    assert_eq!(controller.speak_current(), Some(RequestOutcome::Queued));
    assert!(speech.shutdown(WAIT));
    assert_eq!(log.texts(), vec!["Detected Stop. Stop description."]);

    Ok(())
}

#[test]
fn test_scale_to_width_keeps_aspect() -> anyhow::Result<()> {
    let frame = test_frame(1280, 720);
    assert_eq!(scale_to_width(&frame, 640).dimensions(), (640, 360));
    assert_eq!(scale_to_width(&test_frame(640, 480), 640).dimensions(), (640, 480));

    let config = AppConfig::default();
    assert_eq!(config.display_height(1280, 720), 360);

    Ok(())
}
