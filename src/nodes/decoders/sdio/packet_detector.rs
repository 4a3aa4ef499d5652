//! Packet boundary detection on the command line
//!
//! While searching, the detector hops from one command-line edge to the next
//! and checks the level one data-valid clock edge later. A low level there is
//! a start bit. Inside a packet every rising clock edge samples one command
//! bit into the [`FrameDecoder`], and every falling edge is remembered as the
//! anchor of the next transmission bit.

use super::channels::SdioChannels;
use super::frame_decoder::{FrameDecoder, Step};
use crate::nodes::decoders::sink::FrameSink;
use crate::nodes::decoders::types::{MarkerKind, SdioChannel};
use crate::runtime::{ChannelCursor, WorkResult};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    Searching,
    InPacket,
}

#[derive(Debug, Clone)]
pub struct PacketDetector {
    state: PacketState,
    last_falling_edge: u64,
    clock_markers: bool,
    decoder: FrameDecoder,
    packets: u64,
}

impl PacketDetector {
    pub fn new(clock_markers: bool) -> Self {
        Self {
            state: PacketState::Searching,
            last_falling_edge: 0,
            clock_markers,
            decoder: FrameDecoder::new(),
            packets: 0,
        }
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Most recent falling clock edge seen
    pub fn last_falling_edge(&self) -> u64 {
        self.last_falling_edge
    }

    /// Packets completed so far
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Run one detector step. Returns the number of frames emitted.
    pub fn cycle<C, S>(&mut self, channels: &mut SdioChannels<C>, sink: &mut S) -> WorkResult<usize>
    where
        C: ChannelCursor,
        S: FrameSink,
    {
        match self.state {
            PacketState::Searching => {
                self.search(channels)?;
                Ok(0)
            }
            PacketState::InPacket => self.clock_bit(channels, sink),
        }
    }

    fn search<C: ChannelCursor>(&mut self, channels: &mut SdioChannels<C>) -> WorkResult<()> {
        let edge = channels.cmd.advance_to_next_edge()?;
        self.last_falling_edge = edge;

        channels.clock.advance_to_position(edge)?;
        if channels.clock.bit_state()? {
            // Clock is high: skip its falling edge first
            channels.clock.advance_to_next_edge()?;
        }
        let sampled = channels.clock.advance_to_next_edge()?;
        channels.align_to(sampled)?;

        if !channels.cmd.bit_state()? {
            debug!("start bit at sample {}", sampled);
            self.state = PacketState::InPacket;
        } else {
            trace!("command line high at {}, still searching", sampled);
        }
        Ok(())
    }

    fn clock_bit<C, S>(&mut self, channels: &mut SdioChannels<C>, sink: &mut S) -> WorkResult<usize>
    where
        C: ChannelCursor,
        S: FrameSink,
    {
        let position = channels.clock.advance_to_next_edge()?;
        channels.align_to(position)?;

        if !channels.clock.bit_state()? {
            self.last_falling_edge = position;
            return Ok(0);
        }

        if self.clock_markers {
            sink.mark(position, MarkerKind::UpArrow, SdioChannel::Clock);
        }

        let bit = channels.cmd.bit_state()?;
        let clock = &mut channels.clock;
        match self
            .decoder
            .step(bit, self.last_falling_edge, || clock.sample_of_next_edge())?
        {
            Step::Pending => Ok(0),
            Step::Frame(frame) => {
                sink.emit(frame);
                Ok(1)
            }
            Step::PacketDone => {
                sink.commit_packet_and_start_new();
                sink.commit()?;
                self.packets += 1;
                self.state = PacketState::Searching;
                debug!("packet {} complete at sample {}", self.packets, position);
                Ok(0)
            }
        }
    }
}
