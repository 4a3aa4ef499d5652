//! Protocol decoder nodes
//!
//! Decoders pull edges through [`ChannelCursor`](crate::runtime::ChannelCursor)s
//! and push frames into a [`FrameSink`].

pub mod sdio;
pub mod sink;
pub mod types;

// Re-export common types
pub use sink::{FrameSink, PacketCollector, PacketSender};
pub use types::{Frame, FrameKind, Marker, MarkerKind, Packet, SdioChannel};

// Re-export decoders
pub use sdio::{SdioAnalyzer, SdioChannels, SdioSettings};
