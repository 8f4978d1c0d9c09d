//! Capacity-1 "latest wins" handoff between one producer and one consumer.

use parking_lot::Mutex;

/// Holds at most one pending value. Publishing never blocks on the reader:
/// an unconsumed value is replaced, not queued behind.
#[derive(Debug)]
pub struct FrameSlot<T> {
    pending: Mutex<Option<T>>,
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Store `value`, returning the unconsumed value it displaced, if any.
    pub fn publish(&self, value: T) -> Option<T> {
        self.pending.lock().replace(value)
    }

    /// Drain the pending value without waiting.
    pub fn take(&self) -> Option<T> {
        self.pending.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_none()
    }

    pub fn clear(&self) {
        self.pending.lock().take();
    }
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
