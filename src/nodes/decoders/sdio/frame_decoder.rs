//! Field-level SDIO command line decoder
//!
//! Consumes one command-line bit per data-valid clock edge and closes a
//! [`Frame`] whenever a field is complete:
//!
//! ```text
//! DIR(1) CMD(6) ARG(32 | 127) CRC(7) <end bit>
//! ```
//!
//! CMD52 and CMD53 replace the flat argument with their own field layouts.
//! All widths are fixed by the protocol; a single miscounted bit shifts every
//! later field, so thresholds below are derived from the widths rather than
//! spelled out.

use super::accumulator::BitAccumulator;
use crate::nodes::decoders::types::{Frame, FrameKind};
use crate::runtime::WorkResult;
use tracing::debug;

pub const COMMAND_BITS: u32 = 6;
pub const ARGUMENT_BITS: u32 = 32;
pub const LONG_RESPONSE_BITS: u32 = 127;
pub const CRC_BITS: u32 = 7;

/// The upper part of a long response fills a whole u64.
const LONG_UPPER_BITS: u32 = u64::BITS;
/// Bits still to come when the upper part of a long response is complete.
const LONG_SPLIT_REMAINING: u32 = LONG_RESPONSE_BITS - LONG_UPPER_BITS;

pub const IO_RW_DIRECT: u64 = 52;
pub const IO_RW_EXTENDED: u64 = 53;
pub const APP_CMD: u64 = 55;
/// Commands answered with a 136-bit R2 response (ALL_SEND_CID, SEND_CSD, SEND_CID)
pub const LONG_RESPONSE_COMMANDS: [u64; 3] = [2, 9, 10];

// Nested argument layouts, MSB first.
const RW_FLAG_BITS: u32 = 1;
const FUNCTION_BITS: u32 = 3;
const ADDRESS_BITS: u32 = 17;
const DATA_BITS: u32 = 8;
const RESPONSE_STUFF_BITS: u32 = 16;
const RESPONSE_FLAGS_BITS: u32 = 8;

/// Remaining argument bits once the function number is in.
const FUNCTION_END: u32 = ARGUMENT_BITS - RW_FLAG_BITS - FUNCTION_BITS;
/// Remaining argument bits once the register address is in: two 1-bit flags sit
/// between function and address.
const ADDRESS_END: u32 = FUNCTION_END - 2 - ADDRESS_BITS;
const RESPONSE_STUFF_END: u32 = ARGUMENT_BITS - RESPONSE_STUFF_BITS;
const RESPONSE_FLAGS_END: u32 = RESPONSE_STUFF_END - RESPONSE_FLAGS_BITS;

const _: () = assert!(FUNCTION_END == 28);
const _: () = assert!(ADDRESS_END == DATA_BITS + 1);
const _: () = assert!(RESPONSE_FLAGS_END == DATA_BITS);
const _: () = assert!(LONG_SPLIT_REMAINING == 63);

/// Originator of a packet, from the transmission bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Host,
    Device,
}

impl Direction {
    pub fn from_bit(bit: bool) -> Self {
        if bit { Direction::Host } else { Direction::Device }
    }
}

/// Response shape announced by the last host command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseKind {
    /// No host command seen yet
    #[default]
    None,
    /// 48-bit response with a 32-bit argument
    Normal,
    /// 136-bit R2 response with a 127-bit payload
    Long,
}

impl ResponseKind {
    /// Payload bits following the command field of a device response
    pub fn argument_bits(self) -> u32 {
        match self {
            ResponseKind::Long => LONG_RESPONSE_BITS,
            ResponseKind::None | ResponseKind::Normal => ARGUMENT_BITS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd52State {
    RwFlag,
    Function,
    ReadAfterWrite,
    Stuff1,
    Address,
    Stuff2,
    Data,
    RespStuff,
    RespFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd53State {
    RwFlag,
    Function,
    BlockMode,
    OpCode,
    Address,
    Count,
    RespStuff,
    RespFlags,
    RespStuff2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    TransmissionBit,
    Command,
    Argument,
    Cmd52(Cmd52State),
    Cmd53(Cmd53State),
    Crc7,
    Stop,
}

/// Result of feeding one bit to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Bit absorbed into the current field
    Pending,
    /// A field closed on this bit
    Frame(Frame),
    /// End bit consumed; the packet is complete
    PacketDone,
}

/// Everything the decoder carries between clock edges.
///
/// The accumulator, split register and frame anchor are per packet. The
/// expected response and the application-command flag deliberately outlive
/// the packet: a host command decides how the following device response is
/// parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeContext {
    direction: Option<Direction>,
    app_command: bool,
    response: ResponseKind,
    write: bool,
    acc: BitAccumulator,
    upper: u64,
    frame_start: u64,
}

impl DecodeContext {
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn app_command(&self) -> bool {
        self.app_command
    }

    pub fn response(&self) -> ResponseKind {
        self.response
    }

    pub fn accumulator(&self) -> &BitAccumulator {
        &self.acc
    }

    fn is_host(&self) -> bool {
        self.direction == Some(Direction::Host)
    }

    /// Record what the device will answer to host command `code`.
    fn expect_response_to(&mut self, code: u64) {
        self.response = if self.app_command || !LONG_RESPONSE_COMMANDS.contains(&code) {
            ResponseKind::Normal
        } else {
            ResponseKind::Long
        };
        self.app_command = code == APP_CMD;
    }

    /// Close the current field of the accumulator.
    fn take_field(&mut self, kind: FrameKind) -> Field {
        let bit_len = self.acc.len();
        Field {
            kind,
            value: self.acc.take(),
            secondary: None,
            bit_len,
        }
    }

    fn place(&mut self, field: Field, end: u64) -> Frame {
        let mut frame = Frame::new(field.kind, self.frame_start, end, field.value)
            .with_bit_len(field.bit_len);
        frame.secondary = field.secondary;
        self.frame_start = end + 1;
        frame
    }
}

/// Field contents before its sample span is known
#[derive(Debug, Clone, Copy)]
struct Field {
    kind: FrameKind,
    value: u64,
    secondary: Option<u64>,
    bit_len: u8,
}

enum Outcome {
    Pending,
    Field(Field),
    Done,
}

/// SDIO frame decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: FrameState,
    ctx: DecodeContext,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: FrameState::TransmissionBit,
            ctx: DecodeContext::default(),
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn context(&self) -> &DecodeContext {
        &self.ctx
    }

    /// Drop any partial packet and forget the expected response.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed the command-line level sampled at a data-valid clock edge.
    ///
    /// `anchor` is the falling clock edge preceding this rising edge and only
    /// matters for the transmission bit. `next_edge` yields the clock's next
    /// edge; it is called only when a frame closes, and that frame ends one
    /// sample before it.
    pub fn step<F>(&mut self, bit: bool, anchor: u64, next_edge: F) -> WorkResult<Step>
    where
        F: FnOnce() -> WorkResult<u64>,
    {
        match self.advance(bit, anchor) {
            Outcome::Pending => Ok(Step::Pending),
            Outcome::Done => Ok(Step::PacketDone),
            Outcome::Field(field) => {
                let end = next_edge()?.saturating_sub(1);
                Ok(Step::Frame(self.ctx.place(field, end)))
            }
        }
    }

    fn advance(&mut self, bit: bool, anchor: u64) -> Outcome {
        match self.state {
            FrameState::TransmissionBit => {
                let ctx = &mut self.ctx;
                ctx.direction = Some(Direction::from_bit(bit));
                ctx.frame_start = anchor;
                ctx.acc.start(COMMAND_BITS);
                self.state = FrameState::Command;
                Outcome::Field(Field {
                    kind: FrameKind::Direction,
                    value: u64::from(bit),
                    secondary: None,
                    bit_len: 1,
                })
            }
            FrameState::Command => self.command(bit),
            FrameState::Argument => self.argument(bit),
            FrameState::Cmd52(sub) => self.cmd52(sub, bit),
            FrameState::Cmd53(sub) => self.cmd53(sub, bit),
            FrameState::Crc7 => {
                if !self.ctx.acc.push(bit) {
                    return Outcome::Pending;
                }
                self.state = FrameState::Stop;
                Outcome::Field(self.ctx.take_field(FrameKind::Crc))
            }
            FrameState::Stop => {
                self.state = FrameState::TransmissionBit;
                Outcome::Done
            }
        }
    }

    fn command(&mut self, bit: bool) -> Outcome {
        let ctx = &mut self.ctx;
        if !ctx.acc.push(bit) {
            return Outcome::Pending;
        }

        let field = ctx.take_field(FrameKind::Command);
        let code = field.value;
        let host = ctx.is_host();
        if host {
            ctx.expect_response_to(code);
        }
        debug!(
            "CMD{} from {}, expecting {:?} response",
            code,
            if host { "host" } else { "device" },
            ctx.response
        );

        self.state = match code {
            IO_RW_DIRECT if host => FrameState::Cmd52(Cmd52State::RwFlag),
            IO_RW_DIRECT => FrameState::Cmd52(Cmd52State::RespStuff),
            IO_RW_EXTENDED if host => FrameState::Cmd53(Cmd53State::RwFlag),
            IO_RW_EXTENDED => FrameState::Cmd53(Cmd53State::RespStuff),
            _ => FrameState::Argument,
        };
        ctx.acc.start(if host {
            ARGUMENT_BITS
        } else {
            ctx.response.argument_bits()
        });

        Outcome::Field(field)
    }

    fn argument(&mut self, bit: bool) -> Outcome {
        let ctx = &mut self.ctx;
        let exhausted = ctx.acc.push(bit);
        let remaining = ctx.acc.remaining();
        let device = !ctx.is_host();

        if device && ctx.response == ResponseKind::Long && remaining == 1 {
            // The final payload bit is never sampled; it reads as zero
            ctx.acc.pad();
            let lower = ctx.acc.take();
            self.state = FrameState::Stop;
            Outcome::Field(Field {
                kind: FrameKind::LongArgument,
                value: ctx.upper,
                secondary: Some(lower),
                bit_len: LONG_RESPONSE_BITS as u8,
            })
        } else if exhausted {
            let field = ctx.take_field(FrameKind::Argument);
            ctx.acc.start(CRC_BITS);
            self.state = FrameState::Crc7;
            Outcome::Field(field)
        } else {
            if device && remaining == LONG_SPLIT_REMAINING {
                ctx.upper = ctx.acc.take();
            }
            Outcome::Pending
        }
    }

    fn cmd52(&mut self, sub: Cmd52State, bit: bool) -> Outcome {
        let ctx = &mut self.ctx;
        ctx.acc.push(bit);
        let remaining = ctx.acc.remaining();

        let (next, kind) = match sub {
            Cmd52State::RwFlag => {
                ctx.write = bit;
                (FrameState::Cmd52(Cmd52State::Function), FrameKind::RwFlag)
            }
            Cmd52State::Function if remaining == FUNCTION_END => (
                FrameState::Cmd52(Cmd52State::ReadAfterWrite),
                FrameKind::Function,
            ),
            Cmd52State::ReadAfterWrite => (
                FrameState::Cmd52(Cmd52State::Stuff1),
                FrameKind::ReadAfterWrite,
            ),
            Cmd52State::Stuff1 => (FrameState::Cmd52(Cmd52State::Address), FrameKind::Stuff),
            Cmd52State::Address if remaining == ADDRESS_END => {
                (FrameState::Cmd52(Cmd52State::Stuff2), FrameKind::Address)
            }
            // A write has one stuff bit before the data byte; a read pads to the end
            Cmd52State::Stuff2 if ctx.write => {
                (FrameState::Cmd52(Cmd52State::Data), FrameKind::Stuff)
            }
            Cmd52State::Stuff2 if remaining == 0 => (FrameState::Crc7, FrameKind::Stuff),
            Cmd52State::Data if remaining == 0 => (FrameState::Crc7, FrameKind::Data),
            Cmd52State::RespStuff if remaining == RESPONSE_STUFF_END => {
                (FrameState::Cmd52(Cmd52State::RespFlags), FrameKind::Stuff)
            }
            Cmd52State::RespFlags if remaining == RESPONSE_FLAGS_END => {
                (FrameState::Cmd52(Cmd52State::Data), FrameKind::ResponseFlags)
            }
            _ => return Outcome::Pending,
        };

        self.close_nested(next, kind)
    }

    fn cmd53(&mut self, sub: Cmd53State, bit: bool) -> Outcome {
        let remaining = {
            self.ctx.acc.push(bit);
            self.ctx.acc.remaining()
        };

        let (next, kind) = match sub {
            Cmd53State::RwFlag => (FrameState::Cmd53(Cmd53State::Function), FrameKind::RwFlag),
            Cmd53State::Function if remaining == FUNCTION_END => {
                (FrameState::Cmd53(Cmd53State::BlockMode), FrameKind::Function)
            }
            Cmd53State::BlockMode => (FrameState::Cmd53(Cmd53State::OpCode), FrameKind::BlockMode),
            Cmd53State::OpCode => (FrameState::Cmd53(Cmd53State::Address), FrameKind::OpCode),
            Cmd53State::Address if remaining == ADDRESS_END => {
                (FrameState::Cmd53(Cmd53State::Count), FrameKind::Address)
            }
            Cmd53State::Count if remaining == 0 => (FrameState::Crc7, FrameKind::Count),
            Cmd53State::RespStuff if remaining == RESPONSE_STUFF_END => {
                (FrameState::Cmd53(Cmd53State::RespFlags), FrameKind::Stuff)
            }
            Cmd53State::RespFlags if remaining == RESPONSE_FLAGS_END => {
                (FrameState::Cmd53(Cmd53State::RespStuff2), FrameKind::ResponseFlags)
            }
            Cmd53State::RespStuff2 if remaining == 0 => (FrameState::Crc7, FrameKind::Stuff),
            _ => return Outcome::Pending,
        };

        self.close_nested(next, kind)
    }

    fn close_nested(&mut self, next: FrameState, kind: FrameKind) -> Outcome {
        let field = self.ctx.take_field(kind);
        if next == FrameState::Crc7 {
            self.ctx.acc.start(CRC_BITS);
        }
        self.state = next;
        Outcome::Field(field)
    }
}
