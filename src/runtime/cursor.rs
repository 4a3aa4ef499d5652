//! Edge cursors over run-length encoded channels
//!
//! A [`ChannelCursor`] walks one logic channel edge by edge. The decoders
//! only ever talk to this trait, so they run the same against a live
//! channel-backed stream or an in-memory capture.

use std::collections::VecDeque;

use super::errors::{WorkError, WorkResult};
use super::receiver::Receiver;
use super::sample::Sample;

/// Position-based view of a single logic channel.
///
/// Every method may block while the underlying stream catches up, so all of
/// them are fallible. `WorkError::Shutdown` means a stop was requested and
/// `WorkError::EndOfStream` that the capture has no more edges.
pub trait ChannelCursor {
    /// Signal level at the cursor position.
    fn bit_state(&mut self) -> WorkResult<bool>;

    /// Current cursor position.
    fn sample_number(&mut self) -> WorkResult<u64>;

    /// Move to the next transition and return its position.
    fn advance_to_next_edge(&mut self) -> WorkResult<u64>;

    /// Move forward to `position`. Positions at or behind the cursor are ignored.
    fn advance_to_position(&mut self, position: u64) -> WorkResult<()>;

    /// Position of the next transition, without moving.
    fn sample_of_next_edge(&mut self) -> WorkResult<u64>;
}

/// Ordered source of run-length samples feeding an [`EdgeCursor`].
pub trait EdgeSource {
    fn recv(&mut self) -> WorkResult<Sample>;
    fn peek(&mut self) -> WorkResult<&Sample>;
}

impl EdgeSource for VecDeque<Sample> {
    fn recv(&mut self) -> WorkResult<Sample> {
        self.pop_front().ok_or(WorkError::EndOfStream)
    }

    fn peek(&mut self) -> WorkResult<&Sample> {
        self.front().ok_or(WorkError::EndOfStream)
    }
}

impl EdgeSource for Receiver<Sample> {
    fn recv(&mut self) -> WorkResult<Sample> {
        Receiver::recv(self)
    }

    fn peek(&mut self) -> WorkResult<&Sample> {
        Receiver::peek(self)
    }
}

/// [`ChannelCursor`] implementation over any [`EdgeSource`].
///
/// The cursor sits inside the run `current`, which is valid from
/// `current.position` up to the next sample in the source. The first sample
/// pulled from the source defines the initial position and level.
pub struct EdgeCursor<S> {
    source: S,
    current: Option<Sample>,
    position: u64,
}

impl<S: EdgeSource> EdgeCursor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: None,
            position: 0,
        }
    }

    fn prime(&mut self) -> WorkResult<Sample> {
        if let Some(current) = self.current {
            return Ok(current);
        }
        let first = self.source.recv()?;
        self.position = first.position;
        self.current = Some(first);
        Ok(first)
    }
}

impl EdgeCursor<VecDeque<Sample>> {
    /// Cursor over an in-memory capture.
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self::new(samples.into_iter().collect())
    }
}

impl<S: EdgeSource> ChannelCursor for EdgeCursor<S> {
    fn bit_state(&mut self) -> WorkResult<bool> {
        Ok(self.prime()?.value)
    }

    fn sample_number(&mut self) -> WorkResult<u64> {
        self.prime()?;
        Ok(self.position)
    }

    fn advance_to_next_edge(&mut self) -> WorkResult<u64> {
        let position = self.sample_of_next_edge()?;
        let next = self.source.recv()?;
        self.current = Some(next);
        self.position = position;
        Ok(position)
    }

    fn advance_to_position(&mut self, position: u64) -> WorkResult<()> {
        self.prime()?;
        if position <= self.position {
            return Ok(());
        }

        loop {
            match self.sample_of_next_edge() {
                Ok(edge) if edge <= position => {
                    self.advance_to_next_edge()?;
                }
                Ok(_) => break,
                // Last run extends past the end of the capture
                Err(WorkError::EndOfStream) => break,
                Err(e) => return Err(e),
            }
        }

        self.position = position;
        Ok(())
    }

    fn sample_of_next_edge(&mut self) -> WorkResult<u64> {
        let current = self.prime()?;
        loop {
            let next = *self.source.peek()?;
            if next.is_edge_after(&current) {
                return Ok(next.position);
            }
            // Same level again: not an edge, fold it into the current run
            self.source.recv()?;
        }
    }
}
