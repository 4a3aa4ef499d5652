//! SDIO command-line decoder
//!
//! [`SdioAnalyzer`] walks the clock and command channels through a
//! [`PacketDetector`], which feeds sampled bits to the [`FrameDecoder`] and
//! delivers frames to a [`FrameSink`](super::FrameSink).

pub mod accumulator;
pub mod analyzer;
pub mod channels;
pub mod frame_decoder;
pub mod packet_detector;
pub mod settings;

pub use accumulator::BitAccumulator;
pub use analyzer::SdioAnalyzer;
pub use channels::{DATA_LINES, SdioChannels};
pub use frame_decoder::{
    Cmd52State, Cmd53State, DecodeContext, Direction, FrameDecoder, FrameState, ResponseKind,
    Step,
};
pub use packet_detector::{PacketDetector, PacketState};
pub use settings::{MIN_SAMPLE_RATE_HZ, SdioSettings};
