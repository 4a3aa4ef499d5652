//! Synthetic SDIO capture builder shared by the integration tests
//!
//! Clock period is ten samples: falling at 10c, rising at 10c + 5. The
//! command line changes on falling edges, so every level is sampled in the
//! middle of its cycle.

#![allow(dead_code)]

use sdio::{
    EdgeCursor, Packet, PacketCollector, Sample, SdioAnalyzer, SdioChannels, SdioSettings,
};
use std::collections::VecDeque;
use tracing_subscriber::EnvFilter;

pub const PERIOD: u64 = 10;
pub const SAMPLE_RATE_HZ: u64 = 4_000_000;

const LEAD_IN_CYCLES: usize = 3;
const TAIL_CYCLES: usize = 4;

pub type MemCursor = EdgeCursor<VecDeque<Sample>>;

/// Opt-in log output, e.g. `RUST_LOG=sdio=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// SD CRC7 (x^7 + x^3 + 1) over the bits preceding the CRC field.
pub fn crc7(bits: &[bool]) -> u8 {
    let mut crc = 0u8;
    for &bit in bits {
        let feedback = (crc >> 6) & 1 == 1;
        crc = (crc << 1) & 0x7F;
        if feedback ^ bit {
            crc ^= 0x09;
        }
    }
    crc
}

pub fn push_bits(out: &mut Vec<bool>, value: u128, width: u32) {
    for i in (0..width).rev() {
        out.push((value >> i) & 1 == 1);
    }
}

/// Command-line levels, one per clock cycle starting with cycle 1.
#[derive(Debug, Clone)]
pub struct BusBuilder {
    levels: Vec<bool>,
    starts: Vec<u64>,
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BusBuilder {
    pub fn new() -> Self {
        Self {
            levels: vec![true; LEAD_IN_CYCLES],
            starts: Vec::new(),
        }
    }

    /// Sample position of the falling edge opening cycle index `i` (0-based).
    fn cycle_start(i: usize) -> u64 {
        PERIOD * (i as u64 + 1)
    }

    pub fn idle(mut self, cycles: usize) -> Self {
        self.levels.extend(std::iter::repeat_n(true, cycles));
        self
    }

    /// Start bit, direction, command, `payload`, CRC7 and end bit.
    pub fn packet(mut self, host: bool, code: u8, payload: &[bool]) -> Self {
        let mut bits = vec![false, host];
        push_bits(&mut bits, u128::from(code), 6);
        bits.extend_from_slice(payload);
        let crc = crc7(&bits);
        push_bits(&mut bits, u128::from(crc), 7);
        bits.push(true);

        self.starts.push(Self::cycle_start(self.levels.len() + 1));
        self.levels.extend(bits);
        self
    }

    pub fn host_command(self, code: u8, argument: u32) -> Self {
        self.packet(true, code, &word(argument))
    }

    pub fn device_response(self, code: u8, argument: u32) -> Self {
        self.packet(false, code, &word(argument))
    }

    /// R2 response: reserved command bits all ones, 127 payload bits, no CRC of its own.
    pub fn long_response(mut self, payload: u128) -> Self {
        let mut bits = vec![false, false];
        push_bits(&mut bits, 0x3F, 6);
        push_bits(&mut bits, payload, 127);
        bits.push(true);

        self.starts.push(Self::cycle_start(self.levels.len() + 1));
        self.levels.extend(bits);
        self
    }

    pub fn cmd52_write(self, function: u8, address: u32, data: u8) -> Self {
        self.packet(true, 52, &cmd52_argument(true, function, address, data))
    }

    pub fn cmd52_read(self, function: u8, address: u32) -> Self {
        self.packet(true, 52, &cmd52_argument(false, function, address, 0))
    }

    pub fn cmd52_response(self, flags: u8, data: u8) -> Self {
        let mut payload = Vec::new();
        push_bits(&mut payload, 0, 16);
        push_bits(&mut payload, u128::from(flags), 8);
        push_bits(&mut payload, u128::from(data), 8);
        self.packet(false, 52, &payload)
    }

    pub fn cmd53(self, write: bool, function: u8, block: bool, address: u32, count: u16) -> Self {
        let mut payload = vec![write];
        push_bits(&mut payload, u128::from(function), 3);
        payload.push(block);
        payload.push(true);
        push_bits(&mut payload, u128::from(address), 17);
        push_bits(&mut payload, u128::from(count), 9);
        self.packet(true, 53, &payload)
    }

    pub fn cmd53_response(self, flags: u8) -> Self {
        let mut payload = Vec::new();
        push_bits(&mut payload, 0, 16);
        push_bits(&mut payload, u128::from(flags), 8);
        push_bits(&mut payload, 0, 8);
        self.packet(false, 53, &payload)
    }

    pub fn build(self) -> Capture {
        let levels: Vec<bool> = self
            .levels
            .into_iter()
            .chain(std::iter::repeat_n(true, TAIL_CYCLES))
            .collect();

        let mut clock = vec![Sample::new(true, 0)];
        for c in 1..=levels.len() as u64 {
            clock.push(Sample::new(false, PERIOD * c));
            clock.push(Sample::new(true, PERIOD * c + PERIOD / 2));
        }

        let mut cmd = vec![Sample::new(true, 0)];
        let mut level = true;
        for (i, &bit) in levels.iter().enumerate() {
            if bit != level {
                cmd.push(Sample::new(bit, Self::cycle_start(i)));
                level = bit;
            }
        }

        Capture {
            clock,
            cmd,
            starts: self.starts,
        }
    }
}

pub fn word(value: u32) -> Vec<bool> {
    let mut bits = Vec::new();
    push_bits(&mut bits, u128::from(value), 32);
    bits
}

pub fn cmd52_argument(write: bool, function: u8, address: u32, data: u8) -> Vec<bool> {
    let mut bits = vec![write];
    push_bits(&mut bits, u128::from(function), 3);
    bits.push(false);
    bits.push(false);
    push_bits(&mut bits, u128::from(address), 17);
    bits.push(false);
    push_bits(&mut bits, u128::from(data), 8);
    bits
}

/// Clock and command samples of a synthetic capture.
#[derive(Debug, Clone)]
pub struct Capture {
    pub clock: Vec<Sample>,
    pub cmd: Vec<Sample>,
    /// Expected start sample of each packet's direction frame
    pub starts: Vec<u64>,
}

impl Capture {
    /// Add a low pulse on an idle command line.
    pub fn with_cmd_pulse(mut self, from: u64, to: u64) -> Self {
        self.cmd.push(Sample::new(false, from));
        self.cmd.push(Sample::new(true, to));
        self.cmd.sort_by_key(|s| s.position);
        self
    }

    pub fn channels(&self) -> SdioChannels<MemCursor> {
        SdioChannels::new(
            EdgeCursor::from_samples(self.clock.clone()),
            EdgeCursor::from_samples(self.cmd.clone()),
        )
    }

    pub fn analyzer(&self, settings: SdioSettings) -> SdioAnalyzer<MemCursor, PacketCollector> {
        SdioAnalyzer::new(settings, self.channels(), PacketCollector::new())
            .expect("valid settings")
    }

    /// Decode the whole capture and return the committed packets.
    pub fn decode(&self) -> Vec<Packet> {
        let mut analyzer = self.analyzer(SdioSettings::new(SAMPLE_RATE_HZ));
        analyzer.run_to_end().expect("decode");
        analyzer.into_sink().into_packets()
    }
}
