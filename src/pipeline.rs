use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use image::RgbImage;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::detection::{DetectionGateway, best_detection};
use crate::error::{FrameError, StartupError};
use crate::models::{Detection, FramePacket};
use crate::slot::FrameSlot;

/// How long the capture thread parks per iteration while frozen
pub const FROZEN_IDLE: Duration = Duration::from_millis(5);

/// Sequential video frames on demand. Owned exclusively by the capture thread.
pub trait FrameSource {
    /// Next frame in RGB order. Errors are transient; the caller retries.
    fn next_frame(&mut self) -> Result<RgbImage, FrameError>;

    /// Frame size as (width, height)
    fn resolution(&self) -> (u32, u32);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        (**self).next_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// State shared between the capture thread and the presentation side.
///
/// The slot and the current-detection reference are the only mutable data
/// both sides touch; each is replaced as a whole under its own lock.
#[derive(Debug)]
pub struct PipelineContext {
    slot: FrameSlot<FramePacket>,
    current: RwLock<Option<Detection>>,
    frozen: AtomicBool,
    running: AtomicBool,
    published: AtomicU64,
    skipped: AtomicU64,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self {
            slot: FrameSlot::new(),
            current: RwLock::new(None),
            frozen: AtomicBool::new(false),
            running: AtomicBool::new(true),
            published: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Hand the packet over, displacing whatever the reader has not picked
    /// up yet, then record its best detection as the current one.
    pub fn publish(&self, packet: FramePacket) {
        let detection = packet.detection.clone();
        if self.slot.publish(packet).is_some() {
            debug!("Replaced an unconsumed frame");
        }
        *self.current.write() = detection;
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Non-blocking read of the newest unconsumed frame
    pub fn take_frame(&self) -> Option<FramePacket> {
        self.slot.take()
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.slot.is_empty()
    }

    /// Best detection of the most recently published frame, consumed or not
    pub fn current_detection(&self) -> Option<Detection> {
        self.current.read().clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn set_frozen(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn published_frames(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single capture iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Published { detections: usize },
    Skipped,
    Frozen,
}

/// Camera → detector → slot loop body, independent of any thread.
pub struct CaptureLoop<S: FrameSource> {
    source: S,
    gateway: DetectionGateway,
    context: Arc<PipelineContext>,
    consecutive_failures: u64,
}

impl<S: FrameSource> CaptureLoop<S> {
    pub fn new(source: S, gateway: DetectionGateway, context: Arc<PipelineContext>) -> Self {
        Self {
            source,
            gateway,
            context,
            consecutive_failures: 0,
        }
    }

    /// Run one iteration: read, detect, render, publish.
    pub fn step(&mut self) -> StepOutcome {
        if self.context.is_frozen() {
            return StepOutcome::Frozen;
        }

        let frame = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.record_failure(format_args!("{}", e));
                return StepOutcome::Skipped;
            }
        };

        let detections = match self.gateway.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                self.record_failure(format_args!("detector failed: {:#}", e));
                return StepOutcome::Skipped;
            }
        };

        if self.consecutive_failures > 0 {
            info!("Frame capture recovered after {} failed reads", self.consecutive_failures);
            self.consecutive_failures = 0;
        }

        let rendered = self.gateway.render(&frame, &detections);
        let best = best_detection(&detections);

        // the user may have frozen the view while the detector was running
        if self.context.is_frozen() {
            debug!("Dropping a frame finished after freeze");
            return StepOutcome::Frozen;
        }
        self.context.publish(FramePacket::new(rendered, best));

        StepOutcome::Published {
            detections: detections.len(),
        }
    }

    /// Loop until the context is stopped. Failed reads retry immediately.
    pub fn run(&mut self) {
        while self.context.is_running() {
            match self.step() {
                StepOutcome::Published { .. } => {}
                StepOutcome::Skipped => thread::yield_now(),
                StepOutcome::Frozen => thread::sleep(FROZEN_IDLE),
            }
        }
        debug!("Capture loop exited");
    }

    fn record_failure(&mut self, reason: std::fmt::Arguments<'_>) {
        self.context.skipped.fetch_add(1, Ordering::Relaxed);
        if self.consecutive_failures == 0 {
            debug!("Skipping frame: {}", reason);
        }
        self.consecutive_failures += 1;
    }
}

/// Owner side of a running capture thread.
pub struct CaptureHandle {
    context: Arc<PipelineContext>,
    resolution: (u32, u32),
    join: Option<JoinHandle<()>>,
    done: Receiver<()>,
}

impl CaptureHandle {
    /// Open the frame source on a fresh capture thread and start looping.
    ///
    /// Opening happens on the capture thread so camera handles never cross
    /// threads; this call waits for the open result and returns it.
    pub fn spawn<S, F>(
        open: F,
        gateway: DetectionGateway,
        context: Arc<PipelineContext>,
    ) -> Result<Self, StartupError>
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S, StartupError> + Send + 'static,
    {
        let (init_tx, init_rx) = bounded::<Result<(u32, u32), StartupError>>(1);
        let (done_tx, done_rx) = bounded::<()>(0);
        let loop_context = context.clone();

        let join = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                // dropped on exit, which is what shutdown waits for
                let _done = done_tx;

                let source = match open() {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };

                let resolution = source.resolution();
                if init_tx.send(Ok(resolution)).is_err() {
                    return;
                }

                CaptureLoop::new(source, gateway, loop_context).run();
            })
            .map_err(|e| StartupError::Thread("capture", e))?;

        let resolution = match init_rx.recv() {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                let _ = join.join();
                return Err(e);
            }
            Err(_) => {
                let _ = join.join();
                return Err(StartupError::CameraUnavailable(
                    "capture thread exited before opening the camera".to_string(),
                ));
            }
        };

        info!("Capture started at {}x{}", resolution.0, resolution.1);

        Ok(Self {
            context,
            resolution,
            join: Some(join),
            done: done_rx,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.context
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|join| join.is_finished())
    }

    /// Stop the loop and wait up to `timeout` for the thread to finish.
    /// Returns false if the thread was still busy (e.g. inside a detector
    /// call) when the wait ran out; it is then left to finish on its own.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.context.stop();

        let Some(join) = self.join.take() else {
            return true;
        };

        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!("Capture thread did not stop within {:?}", timeout);
                false
            }
            _ => {
                let _ = join.join();
                info!("Capture stopped");
                true
            }
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.context.stop();
    }
}
