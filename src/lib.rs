//! SDIO command-line protocol analyzer with a streaming node-based API
//!
//! Decodes the command line of an SDIO bus from captured logic channels into
//! packets of typed, contiguous frames: direction, command, argument (or the
//! CMD52/CMD53 sub-fields, or a 127-bit long response) and CRC.
//!
//! # Architecture
//!
//! - **EdgeCursor**: Edge-by-edge view of a run-length encoded channel,
//!   backed by an in-memory capture or a crossbeam channel
//! - **SdioAnalyzer**: Packet detection and field decoding as a process node
//! - **FrameSink**: Staged packet output; only completed packets are published
//! - **Scheduler**: Thread-per-node execution with cooperative stop
//!
//! # Example
//!
//! ```no_run
//! use sdio::{EdgeCursor, PacketCollector, Sample, SdioAnalyzer, SdioChannels, SdioSettings};
//!
//! let clock = EdgeCursor::from_samples(vec![Sample::new(true, 0), Sample::new(false, 10)]);
//! let cmd = EdgeCursor::from_samples(vec![Sample::new(true, 0)]);
//! let mut analyzer = SdioAnalyzer::new(
//!     SdioSettings::new(50_000_000),
//!     SdioChannels::new(clock, cmd),
//!     PacketCollector::new(),
//! )?;
//! analyzer.run_to_end()?;
//! for packet in analyzer.sink().packets() {
//!     println!("{:?}", packet.kinds());
//! }
//! # Ok::<(), sdio::SdioError>(())
//! ```

use thiserror::Error;

pub mod nodes;
pub mod runtime;

// Re-export decoder data types
pub use nodes::decoders::{Frame, FrameKind, Marker, MarkerKind, Packet, SdioChannel};

// Re-export sinks and the analyzer
pub use nodes::decoders::sdio::{MIN_SAMPLE_RATE_HZ, SdioAnalyzer, SdioChannels, SdioSettings};
pub use nodes::decoders::{FrameSink, PacketCollector, PacketSender};

// Re-export streaming runtime components
pub use runtime::{
    ChannelCursor, EdgeCursor, ProcessNode, Receiver, Sample, Scheduler, Sender, WorkError,
    WorkResult, channel,
};

#[derive(Error, Debug)]
pub enum SdioError {
    #[error("Sample rate {rate} Hz is below the minimum of {minimum} Hz")]
    SampleRateTooLow { rate: u64, minimum: u64 },

    #[error("Decode error: {0}")]
    Work(#[from] WorkError),
}

pub type Result<T> = std::result::Result<T, SdioError>;
