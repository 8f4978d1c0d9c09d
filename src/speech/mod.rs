//! Serialized text-to-speech.
//!
//! Requests go through a bounded queue to one worker thread that owns the
//! speech engine, so utterances never overlap and callers never wait.

pub mod command;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{SpeechError, StartupError};

pub use command::{CommandSpeechEngine, MissingSpeechEngine};

/// Blocking text-to-speech backend. `speak` returns once the utterance has
/// finished playing.
pub trait SpeechEngine: Send {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        (**self).speak(text)
    }
}

enum SpeechCommand {
    Say(String),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Queued,
    Dropped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpeechStats {
    pub spoken: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct WorkerState {
    speaking: AtomicBool,
    spoken: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

pub struct SpeechDispatcher {
    sender: Sender<SpeechCommand>,
    state: Arc<WorkerState>,
    accepting: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    done: Receiver<()>,
}

impl SpeechDispatcher {
    /// Spawn the speech worker with room for `capacity` pending requests.
    pub fn start<E>(engine: E, capacity: usize) -> Result<Self, StartupError>
    where
        E: SpeechEngine + 'static,
    {
        let (sender, receiver) = bounded(capacity.max(1));
        let (done_tx, done_rx) = bounded::<()>(0);
        let state = Arc::new(WorkerState::default());
        let worker_state = state.clone();

        let worker = thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                let _done = done_tx;
                run_worker(engine, receiver, worker_state);
            })
            .map_err(|e| StartupError::Thread("speech", e))?;

        info!("Speech worker started (queue capacity {})", capacity.max(1));

        Ok(Self {
            sender,
            state,
            accepting: AtomicBool::new(true),
            worker: Mutex::new(Some(worker)),
            done: done_rx,
        })
    }

    /// Queue `text` for speaking. Never blocks: when the queue is full, or
    /// the dispatcher is shutting down, the request is dropped and logged.
    pub fn request(&self, text: impl Into<String>) -> RequestOutcome {
        if !self.accepting.load(Ordering::Acquire) {
            self.state.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Speech dispatcher is shut down, dropping request");
            return RequestOutcome::Dropped;
        }

        match self.sender.try_send(SpeechCommand::Say(text.into())) {
            Ok(()) => RequestOutcome::Queued,
            Err(TrySendError::Full(_)) => {
                self.state.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Speech queue is full, skipping this announcement");
                RequestOutcome::Dropped
            }
            Err(TrySendError::Disconnected(_)) => {
                self.state.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Speech worker is gone, dropping request");
                RequestOutcome::Dropped
            }
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.state.speaking.load(Ordering::Acquire)
    }

    /// Requests waiting behind the one currently being spoken
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    pub fn stats(&self) -> SpeechStats {
        SpeechStats {
            spoken: self.state.spoken.load(Ordering::Relaxed),
            failed: self.state.failed.load(Ordering::Relaxed),
            dropped: self.state.dropped.load(Ordering::Relaxed),
        }
    }

    /// Queue the stop sentinel behind any pending requests and wait up to
    /// `timeout` for the worker to exit. Returns false if it was still busy
    /// when time ran out; shutdown carries on either way.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.accepting.store(false, Ordering::Release);

        let Some(worker) = self.worker.lock().take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        match self.sender.send_timeout(SpeechCommand::Stop, timeout) {
            Ok(()) | Err(SendTimeoutError::Disconnected(_)) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                warn!("Speech queue stayed full for {:?}, abandoning worker", timeout);
                return false;
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.done.recv_timeout(remaining) {
            Err(RecvTimeoutError::Timeout) => {
                warn!("Speech worker did not finish within {:?}", timeout);
                false
            }
            _ => {
                let _ = worker.join();
                info!("Speech worker stopped");
                true
            }
        }
    }
}

impl Drop for SpeechDispatcher {
    fn drop(&mut self) {
        if self.worker.get_mut().is_some() {
            self.accepting.store(false, Ordering::Release);
            let _ = self.sender.try_send(SpeechCommand::Stop);
        }
    }
}

fn run_worker<E: SpeechEngine>(mut engine: E, receiver: Receiver<SpeechCommand>, state: Arc<WorkerState>) {
    while let Ok(command) = receiver.recv() {
        let text = match command {
            SpeechCommand::Say(text) => text,
            SpeechCommand::Stop => break,
        };

        state.speaking.store(true, Ordering::Release);
        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.speak(&text)));
        state.speaking.store(false, Ordering::Release);

        match result {
            Ok(Ok(())) => {
                state.spoken.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                state.failed.fetch_add(1, Ordering::Relaxed);
                error!("Speech error: {}", e);
            }
            Err(_) => {
                state.failed.fetch_add(1, Ordering::Relaxed);
                error!("Speech engine panicked while speaking");
            }
        }
    }
    debug!("Speech worker exiting");
}
