//! Single-producer/single-consumer frame hand-off between the capture loop
//! and the recognizer: only the most recent frame matters, and the
//! recognizer should block until a new one has arrived rather than busy-poll.
//!
//! Modeled in the small-focused-module style of `strand-cam`'s
//! `post_trigger_buffer.rs`/`interval_stream.rs`. The teacher's own
//! blocking `channellib`/`crossbeam-channel` wrapper assumes a std-thread
//! producer and consumer; both sides here are tokio tasks, and the
//! overwrite-on-publish slot semantics don't map onto a channel anyway, so
//! this is a `Mutex<Option<Frame>>` plus a `tokio::sync::Notify` instead.

use std::sync::Mutex;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct Frame {
    pub id: u64,
    pub masked_jpeg: Vec<u8>,
    pub raw_jpeg: Vec<u8>,
    pub captured_at: f64,
}

/// Overwrite-on-write, wait-for-next-on-read slot.
pub struct FrameSlot {
    inner: Mutex<Option<Frame>>,
    notify: Notify,
}

impl FrameSlot {
    pub fn new() -> Self {
        FrameSlot {
            inner: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Publish a new frame, waking exactly one waiting reader.
    pub fn publish(&self, frame: Frame) {
        *self.inner.lock().unwrap() = Some(frame);
        self.notify.notify_one();
    }

    /// Take the current frame if present, without waiting.
    pub fn try_take(&self) -> Option<Frame> {
        self.inner.lock().unwrap().take()
    }

    /// Clone the current frame without consuming it, for read-only
    /// consumers like the stream server that must not starve the
    /// recognizer of frames.
    pub fn peek(&self) -> Option<Frame> {
        self.inner.lock().unwrap().clone()
    }

    /// Wait until a frame is available, then take it.
    pub async fn wait_take(&self) -> Frame {
        loop {
            if let Some(frame) = self.try_take() {
                return frame;
            }
            self.notify.notified().await;
        }
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        FrameSlot::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_take_resolves_after_publish() {
        let slot = FrameSlot::new();
        slot.publish(Frame {
            id: 1,
            masked_jpeg: vec![1, 2, 3],
            raw_jpeg: vec![1, 2, 3],
            captured_at: 0.0,
        });
        let frame = slot.wait_take().await;
        assert_eq!(frame.id, 1);
    }

    #[test]
    fn try_take_is_none_when_empty() {
        let slot = FrameSlot::new();
        assert!(slot.try_take().is_none());
    }
}
