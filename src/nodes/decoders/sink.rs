//! Frame sinks: where decoders deliver frames and packet boundaries
//!
//! Frames of the packet being decoded are staged. Sealing a packet queues
//! it, and only `commit()` publishes queued packets. A packet that is never
//! sealed (cancelled mid-decode) is never published.

use super::types::{Frame, Marker, MarkerKind, Packet, SdioChannel};
use crate::runtime::{Sender, WorkResult};
use std::mem;
use tracing::{debug, trace};

/// Destination for decoded frames
pub trait FrameSink {
    /// Append a frame to the open packet
    fn emit(&mut self, frame: Frame);

    /// Place an edge annotation on the open packet
    fn mark(&mut self, position: u64, kind: MarkerKind, channel: SdioChannel);

    /// Seal the open packet and open a fresh one
    fn commit_packet_and_start_new(&mut self);

    /// Publish sealed packets
    fn commit(&mut self) -> WorkResult<()>;

    /// Advisory decode progress
    fn report_progress(&mut self, _position: u64) {}
}

/// Staging area shared by the sinks
#[derive(Debug, Default)]
struct PacketStaging {
    open: Packet,
    sealed: Vec<Packet>,
    next_id: u64,
}

impl PacketStaging {
    fn emit(&mut self, frame: Frame) {
        trace!("frame {}", frame);
        self.open.frames.push(frame);
    }

    fn mark(&mut self, position: u64, kind: MarkerKind, channel: SdioChannel) {
        self.open.markers.push(Marker {
            position,
            kind,
            channel,
        });
    }

    fn seal(&mut self) {
        self.next_id += 1;
        let mut packet = mem::replace(&mut self.open, Packet::new(self.next_id));
        if packet.frames.is_empty() {
            return;
        }
        packet.markers.sort_by_key(|m| m.position);
        debug!(
            "packet #{} sealed: {} frames, samples {:?}..={:?}",
            packet.id,
            packet.frames.len(),
            packet.start(),
            packet.end()
        );
        self.sealed.push(packet);
    }

    fn take_sealed(&mut self) -> Vec<Packet> {
        mem::take(&mut self.sealed)
    }

    fn open_frames(&self) -> usize {
        self.open.frames.len()
    }
}

/// In-memory sink that keeps every committed packet
#[derive(Debug, Default)]
pub struct PacketCollector {
    staging: PacketStaging,
    packets: Vec<Packet>,
    progress: Option<u64>,
}

impl PacketCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packets published so far
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn into_packets(self) -> Vec<Packet> {
        self.packets
    }

    /// Frames staged for a packet that has not been sealed
    pub fn pending_frames(&self) -> usize {
        self.staging.open_frames()
    }

    /// Last position passed to `report_progress`
    pub fn progress(&self) -> Option<u64> {
        self.progress
    }
}

impl FrameSink for PacketCollector {
    fn emit(&mut self, frame: Frame) {
        self.staging.emit(frame);
    }

    fn mark(&mut self, position: u64, kind: MarkerKind, channel: SdioChannel) {
        self.staging.mark(position, kind, channel);
    }

    fn commit_packet_and_start_new(&mut self) {
        self.staging.seal();
    }

    fn commit(&mut self) -> WorkResult<()> {
        self.packets.extend(self.staging.take_sealed());
        Ok(())
    }

    fn report_progress(&mut self, position: u64) {
        self.progress = Some(position);
    }
}

/// Sink that streams committed packets to downstream consumers
///
/// The stream is closed when the sink is dropped, so consumers see
/// `EndOfStream` once the decoder worker exits.
pub struct PacketSender {
    staging: PacketStaging,
    output: Sender<Packet>,
}

impl PacketSender {
    pub fn new(output: Sender<Packet>) -> Self {
        Self {
            staging: PacketStaging::default(),
            output,
        }
    }
}

impl FrameSink for PacketSender {
    fn emit(&mut self, frame: Frame) {
        self.staging.emit(frame);
    }

    fn mark(&mut self, position: u64, kind: MarkerKind, channel: SdioChannel) {
        self.staging.mark(position, kind, channel);
    }

    fn commit_packet_and_start_new(&mut self) {
        self.staging.seal();
    }

    fn commit(&mut self) -> WorkResult<()> {
        for packet in self.staging.take_sealed() {
            self.output.send(packet)?;
        }
        Ok(())
    }
}

impl Drop for PacketSender {
    fn drop(&mut self) {
        if self.staging.open_frames() > 0 {
            debug!(
                "discarding {} frames of an unfinished packet",
                self.staging.open_frames()
            );
        }
        self.output.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::decoders::types::FrameKind;
    use crate::runtime::{WorkError, channel};

    fn frame(kind: FrameKind, start: u64, end: u64) -> Frame {
        Frame::new(kind, start, end, 0)
    }

    #[test]
    fn test_collector_publishes_only_on_commit() {
        let mut sink = PacketCollector::new();
        sink.emit(frame(FrameKind::Direction, 0, 9));
        sink.mark(5, MarkerKind::UpArrow, SdioChannel::Clock);
        sink.emit(frame(FrameKind::Crc, 10, 19));
        assert_eq!(sink.pending_frames(), 2);

        sink.commit_packet_and_start_new();
        assert!(sink.packets().is_empty());

        sink.commit().unwrap();
        assert_eq!(sink.packets().len(), 1);
        assert_eq!(sink.packets()[0].frames.len(), 2);
        assert_eq!(sink.packets()[0].markers.len(), 1);
        assert_eq!(sink.pending_frames(), 0);
    }

    #[test]
    fn test_unsealed_frames_are_never_published() {
        let mut sink = PacketCollector::new();
        sink.emit(frame(FrameKind::Direction, 0, 9));
        sink.commit().unwrap();
        assert!(sink.packets().is_empty());
    }

    #[test]
    fn test_packet_ids_increase() {
        let mut sink = PacketCollector::new();
        for i in 0..3 {
            sink.emit(frame(FrameKind::Direction, i * 10, i * 10 + 9));
            sink.commit_packet_and_start_new();
        }
        sink.commit().unwrap();
        let ids: Vec<u64> = sink.packets().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_sender_streams_packets_and_closes_on_drop() {
        let (tx, mut rx) = channel::<Packet>(8);
        let mut sink = PacketSender::new(tx);

        sink.emit(frame(FrameKind::Direction, 0, 9));
        sink.commit_packet_and_start_new();
        sink.emit(frame(FrameKind::Direction, 10, 19));
        sink.commit().unwrap();
        drop(sink);

        let packet = rx.recv().unwrap();
        assert_eq!(packet.frames.len(), 1);
        assert!(matches!(rx.recv(), Err(WorkError::EndOfStream)));
    }
}
