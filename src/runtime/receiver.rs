//! Channel receiver with a putback buffer and cooperative cancellation
//!
//! [`Receiver`] wraps a single `crossbeam_channel::Receiver<ChannelMessage<T>>`
//! with a putback buffer, providing `recv`, `peek` and `put_back`. It
//! transparently unwraps `ChannelMessage` and caches end-of-stream state so
//! subsequent calls keep returning `EndOfStream`.
//!
//! Blocking calls wait in short slices so a raised stop signal is noticed
//! promptly. These waits are the only suspension points of a decoder worker.

use crossbeam_channel::{Receiver as CrossbeamReceiver, RecvTimeoutError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::errors::{WorkError, WorkResult};
use super::sender::ChannelMessage;

/// How long a blocking receive waits before re-checking the stop signal.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A single crossbeam receiver with a putback buffer.
pub struct Receiver<T> {
    receiver: CrossbeamReceiver<ChannelMessage<T>>,
    buffer: VecDeque<T>,
    eos: bool,
    stop_signal: Option<Arc<AtomicBool>>,
}

impl<T> Receiver<T> {
    /// Create a new receiver.
    pub fn new(receiver: CrossbeamReceiver<ChannelMessage<T>>) -> Self {
        Self {
            receiver,
            buffer: VecDeque::new(),
            eos: false,
            stop_signal: None,
        }
    }

    /// Observe a shared stop signal while blocked.
    pub fn with_stop_signal(mut self, stop_signal: Arc<AtomicBool>) -> Self {
        self.stop_signal = Some(stop_signal);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop_signal
            .as_ref()
            .is_some_and(|s| s.load(Ordering::Relaxed))
    }

    /// Block until the channel yields an item, the stream ends, or a stop is requested.
    fn recv_from_channel(&mut self) -> WorkResult<T> {
        if self.eos {
            return Err(WorkError::EndOfStream);
        }

        loop {
            if self.stop_requested() {
                tracing::debug!("Receiver - stop requested, returning Shutdown");
                return Err(WorkError::Shutdown);
            }

            match self.receiver.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(ChannelMessage::Sample(item)) => return Ok(item),
                Ok(ChannelMessage::EndOfStream) => {
                    self.eos = true;
                    tracing::debug!("Receiver - EndOfStream received");
                    return Err(WorkError::EndOfStream);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.eos = true;
                    tracing::debug!("Receiver - channel disconnected, returning EndOfStream");
                    return Err(WorkError::EndOfStream);
                }
            }
        }
    }

    /// Blocking receive. Returns from the putback buffer first, then
    /// falls through to the underlying channel.
    pub fn recv(&mut self) -> WorkResult<T> {
        if self.stop_requested() {
            return Err(WorkError::Shutdown);
        }

        if let Some(item) = self.buffer.pop_front() {
            return Ok(item);
        }

        self.recv_from_channel()
    }

    /// Peek at the front item. If the buffer is empty, blocks on the
    /// channel to populate it.
    pub fn peek(&mut self) -> WorkResult<&T> {
        if self.stop_requested() {
            return Err(WorkError::Shutdown);
        }

        if self.buffer.is_empty() {
            let item = self.recv_from_channel()?;
            self.buffer.push_back(item);
        }
        self.buffer.front().ok_or(WorkError::EndOfStream)
    }

    /// Push an item back to the front of the buffer so the next `recv()`
    /// returns it.
    pub fn put_back(&mut self, item: T) {
        self.buffer.push_front(item);
    }

    /// Check if there are any buffered items.
    pub fn has_buffered(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Whether end-of-stream has been observed on the channel.
    pub fn is_finished(&self) -> bool {
        self.eos && self.buffer.is_empty()
    }
}
