use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use aqroad::{
    DetectionGateway, FrameError, FrameSource, RawDetection, SignCatalog, SignDetector, SpeechEngine,
    SpeechError,
};
use crossbeam_channel::{Receiver, Sender};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;

/// Background gray used by every generated frame
pub const FRAME_GRAY: Rgb<u8> = Rgb([40, 40, 40]);

/// GTSRB class id of the stop sign
pub const STOP_CLASS: i64 = 14;

/// Creates a plain gray frame of the given size.
pub fn test_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, FRAME_GRAY)
}

/// A raw stop sign detection at `[10, 20, 60, 70]`
pub fn stop_sign(confidence: f32) -> RawDetection {
    RawDetection::new([10.0, 20.0, 60.0, 70.0], confidence, STOP_CLASS)
}

/// Gateway over the GTSRB catalog with the default threshold.
pub fn gateway_with(detector: impl SignDetector + 'static) -> DetectionGateway {
    DetectionGateway::new(detector, Arc::new(SignCatalog::gtsrb()))
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Detector returning the same scripted result for every frame.
pub struct FakeDetector {
    result: Result<Vec<RawDetection>, String>,
    calls: Arc<AtomicUsize>,
}

impl FakeDetector {
    pub fn returning(detections: Vec<RawDetection>) -> Self {
        Self {
            result: Ok(detections),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::returning(Vec::new())
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `infer` calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl SignDetector for FakeDetector {
    fn infer(&self, _image: &RgbImage) -> anyhow::Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(detections) => Ok(detections.clone()),
            Err(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }
}

/// Camera that plays back a fixed sequence of reads, then keeps failing.
pub struct ScriptedCamera {
    script: VecDeque<Result<RgbImage, FrameError>>,
    reads: Arc<AtomicUsize>,
    resolution: (u32, u32),
}

impl ScriptedCamera {
    pub fn new(script: Vec<Result<RgbImage, FrameError>>) -> Self {
        Self {
            script: script.into(),
            reads: Arc::new(AtomicUsize::new(0)),
            resolution: (64, 48),
        }
    }

    /// `failures` failed reads followed by `frames` good frames
    pub fn failing_then_ok(failures: usize, frames: usize) -> Self {
        let mut script = Vec::new();
        for i in 0..failures {
            script.push(Err(FrameError::Unavailable(format!("read {} failed", i))));
        }
        for _ in 0..frames {
            script.push(Ok(test_frame(64, 48)));
        }
        Self::new(script)
    }

    /// Shared counter of `next_frame` calls
    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

impl FrameSource for ScriptedCamera {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(FrameError::Unavailable("end of script".to_string())))
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

/// Camera that delivers good frames forever
pub struct EndlessCamera {
    reads: Arc<AtomicUsize>,
}

impl EndlessCamera {
    pub fn new() -> Self {
        Self {
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

impl FrameSource for EndlessCamera {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        Ok(test_frame(64, 48))
    }

    fn resolution(&self) -> (u32, u32) {
        (64, 48)
    }
}

/// One finished call into a speech engine
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub started: Instant,
    pub finished: Instant,
}

/// What a [`RecordingEngine`] saw, shared with the test body.
#[derive(Default)]
pub struct SpeechLog {
    utterances: Mutex<Vec<Utterance>>,
    active: AtomicUsize,
    overlapped: AtomicBool,
}

impl SpeechLog {
    pub fn texts(&self) -> Vec<String> {
        self.utterances.lock().iter().map(|u| u.text.clone()).collect()
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.utterances.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.utterances.lock().len()
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

/// Engine that takes `delay` per utterance and records every call.
/// Texts listed in `fail_on` return an error, texts in `panic_on` panic.
pub struct RecordingEngine {
    log: Arc<SpeechLog>,
    delay: Duration,
    fail_on: Vec<String>,
    panic_on: Vec<String>,
}

impl RecordingEngine {
    pub fn new(delay: Duration) -> (Self, Arc<SpeechLog>) {
        let log = Arc::new(SpeechLog::default());
        let engine = Self {
            log: log.clone(),
            delay,
            fail_on: Vec::new(),
            panic_on: Vec::new(),
        };
        (engine, log)
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.push(text.to_string());
        self
    }

    pub fn panicking_on(mut self, text: &str) -> Self {
        self.panic_on.push(text.to_string());
        self
    }
}

impl SpeechEngine for RecordingEngine {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        if self.log.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.log.overlapped.store(true, Ordering::SeqCst);
        }
        let started = Instant::now();
        thread::sleep(self.delay);
        self.log.active.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on.iter().any(|t| t == text) {
            panic!("engine crashed on {:?}", text);
        }
        if self.fail_on.iter().any(|t| t == text) {
            return Err(SpeechError::Engine(format!("cannot say {:?}", text)));
        }

        self.log.utterances.lock().push(Utterance {
            text: text.to_string(),
            started,
            finished: Instant::now(),
        });
        Ok(())
    }
}

/// Engine that holds each utterance until the test releases it.
pub struct GatedEngine {
    started: Sender<String>,
    release: Receiver<()>,
}

/// Test side of a [`GatedEngine`]
pub struct Gate {
    pub started: Receiver<String>,
    pub release: Sender<()>,
}

impl GatedEngine {
    pub fn new() -> (Self, Gate) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        (
            Self {
                started: started_tx,
                release: release_rx,
            },
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl SpeechEngine for GatedEngine {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let _ = self.started.send(text.to_string());
        let _ = self.release.recv_timeout(Duration::from_secs(5));
        Ok(())
    }
}

/// Detector that reports when `infer` starts, then holds until released.
pub struct BlockingDetector {
    result: Vec<RawDetection>,
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Test side of a [`BlockingDetector`]
pub struct DetectorGate {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

impl BlockingDetector {
    pub fn new(result: Vec<RawDetection>) -> (Self, DetectorGate) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        (
            Self {
                result,
                entered: entered_tx,
                release: release_rx,
            },
            DetectorGate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl SignDetector for BlockingDetector {
    fn infer(&self, _image: &RgbImage) -> anyhow::Result<Vec<RawDetection>> {
        let _ = self.entered.send(());
        let _ = self.release.recv_timeout(Duration::from_secs(5));
        Ok(self.result.clone())
    }
}
