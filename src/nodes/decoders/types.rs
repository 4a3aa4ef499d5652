//! Common decoder types and enums

use std::fmt;

/// Logical SDIO signal lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdioChannel {
    Clock,
    Cmd,
    /// DAT0..DAT3
    Data(u8),
}

impl fmt::Display for SdioChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SdioChannel::Clock => write!(f, "CLK"),
            SdioChannel::Cmd => write!(f, "CMD"),
            SdioChannel::Data(n) => write!(f, "DAT{}", n),
        }
    }
}

/// Visual annotation kinds placed on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Data-valid rising clock edge
    UpArrow,
}

/// Edge annotation produced alongside frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub position: u64,
    pub kind: MarkerKind,
    pub channel: SdioChannel,
}

/// Field carried by a decoded frame
///
/// The CMD52 and CMD53 argument grammars share the kinds for fields they
/// have in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Transmission bit: 1 = host, 0 = device
    Direction,
    /// 6-bit command index
    Command,
    /// Plain 32-bit argument
    Argument,
    /// 127-bit response payload, split over `value` (upper) and `secondary` (lower)
    LongArgument,
    Crc,
    RwFlag,
    Function,
    /// CMD52 read-after-write flag
    ReadAfterWrite,
    Stuff,
    Address,
    /// CMD52 data byte
    Data,
    ResponseFlags,
    /// CMD53 block mode flag
    BlockMode,
    /// CMD53 incrementing address flag
    OpCode,
    /// CMD53 block or byte count
    Count,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FrameKind::Direction => "DIR",
            FrameKind::Command => "CMD",
            FrameKind::Argument => "ARG",
            FrameKind::LongArgument => "LONG_ARG",
            FrameKind::Crc => "CRC",
            FrameKind::RwFlag => "RW",
            FrameKind::Function => "FN",
            FrameKind::ReadAfterWrite => "RAW",
            FrameKind::Stuff => "STUFF",
            FrameKind::Address => "ADDR",
            FrameKind::Data => "DATA",
            FrameKind::ResponseFlags => "FLAGS",
            FrameKind::BlockMode => "BLOCK",
            FrameKind::OpCode => "OP",
            FrameKind::Count => "COUNT",
        };
        f.write_str(name)
    }
}

/// One decoded field of a packet
///
/// `start` and `end` are inclusive sample positions. Within a packet each
/// frame starts exactly one sample after the previous one ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub start: u64,
    pub end: u64,
    pub kind: FrameKind,
    pub value: u64,
    pub secondary: Option<u64>,
    /// Bits accumulated for the field
    pub bit_len: Option<u8>,
}

impl Frame {
    pub fn new(kind: FrameKind, start: u64, end: u64, value: u64) -> Self {
        Self {
            start,
            end,
            kind,
            value,
            secondary: None,
            bit_len: None,
        }
    }

    pub fn with_secondary(mut self, secondary: u64) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_bit_len(mut self, bit_len: u8) -> Self {
        self.bit_len = Some(bit_len);
        self
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}..={}]=0x{:X}", self.kind, self.start, self.end, self.value)?;
        if let Some(secondary) = self.secondary {
            write!(f, ":0x{:X}", secondary)?;
        }
        Ok(())
    }
}

/// A committed command or response: every frame from the direction bit to the CRC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    pub id: u64,
    pub frames: Vec<Frame>,
    pub markers: Vec<Marker>,
}

impl Packet {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            frames: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// First sample covered by the packet
    pub fn start(&self) -> Option<u64> {
        self.frames.first().map(|f| f.start)
    }

    /// Last sample covered by the packet
    pub fn end(&self) -> Option<u64> {
        self.frames.last().map(|f| f.end)
    }

    /// Whether the packet was sent by the host
    pub fn is_host(&self) -> Option<bool> {
        self.frame(FrameKind::Direction).map(|f| f.value == 1)
    }

    /// Decoded command index
    pub fn command(&self) -> Option<u8> {
        self.frame(FrameKind::Command).map(|f| f.value as u8)
    }

    /// First frame of the given kind
    pub fn frame(&self, kind: FrameKind) -> Option<&Frame> {
        self.frames.iter().find(|f| f.kind == kind)
    }

    pub fn kinds(&self) -> Vec<FrameKind> {
        self.frames.iter().map(|f| f.kind).collect()
    }

    /// True when no two consecutive frames leave a gap or overlap
    pub fn is_contiguous(&self) -> bool {
        self.frames
            .windows(2)
            .all(|w| w[0].end.checked_add(1) == Some(w[1].start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_accessors() {
        let mut packet = Packet::new(3);
        packet.frames.push(Frame::new(FrameKind::Direction, 10, 19, 1));
        packet.frames.push(Frame::new(FrameKind::Command, 20, 79, 52));
        packet.frames.push(Frame::new(FrameKind::Crc, 80, 149, 0x2A));

        assert_eq!(packet.start(), Some(10));
        assert_eq!(packet.end(), Some(149));
        assert_eq!(packet.is_host(), Some(true));
        assert_eq!(packet.command(), Some(52));
        assert!(packet.is_contiguous());
    }

    #[test]
    fn test_gap_breaks_contiguity() {
        let mut packet = Packet::new(0);
        packet.frames.push(Frame::new(FrameKind::Direction, 0, 9, 0));
        packet.frames.push(Frame::new(FrameKind::Command, 11, 20, 3));
        assert!(!packet.is_contiguous());
    }

    #[test]
    fn test_frame_display() {
        let frame = Frame::new(FrameKind::LongArgument, 5, 9, 0xAB).with_secondary(0x1);
        assert_eq!(frame.to_string(), "LONG_ARG[5..=9]=0xAB:0x1");
    }
}
