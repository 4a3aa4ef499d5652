//! SDIO command-line analyzer node

use super::channels::SdioChannels;
use super::packet_detector::PacketDetector;
use super::settings::SdioSettings;
use crate::nodes::decoders::sink::FrameSink;
use crate::runtime::{ChannelCursor, ProcessNode, WorkResult};
use tracing::{debug, info};

/// Decodes SDIO command-line traffic from clock and command channels.
///
/// Each [`work`](ProcessNode::work) call advances the packet detector by one
/// clock edge (or one command-line edge while searching), publishes any
/// packet completed on the way and reports progress as the clock position.
pub struct SdioAnalyzer<C, S> {
    settings: SdioSettings,
    channels: SdioChannels<C>,
    detector: PacketDetector,
    sink: S,
    started: bool,
    frames: u64,
}

impl<C: ChannelCursor, S: FrameSink> SdioAnalyzer<C, S> {
    /// Create an analyzer. Fails if the sample rate is below
    /// [`MIN_SAMPLE_RATE_HZ`](super::settings::MIN_SAMPLE_RATE_HZ).
    pub fn new(settings: SdioSettings, channels: SdioChannels<C>, sink: S) -> crate::Result<Self> {
        settings.validate()?;
        info!(
            "[{}] SDIO analyzer at {} Hz, {} data line(s), clock markers {}",
            settings.name,
            settings.sample_rate_hz,
            channels.data_lines(),
            if settings.clock_markers { "on" } else { "off" }
        );
        let detector = PacketDetector::new(settings.clock_markers);
        Ok(Self {
            settings,
            channels,
            detector,
            sink,
            started: false,
            frames: 0,
        })
    }

    pub fn settings(&self) -> &SdioSettings {
        &self.settings
    }

    pub fn detector(&self) -> &PacketDetector {
        &self.detector
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Frames emitted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Move the clock to its first edge and line up the other channels.
    fn start(&mut self) -> WorkResult<()> {
        let position = self.channels.clock.advance_to_next_edge()?;
        self.channels.align_to(position)?;
        self.started = true;
        debug!("[{}] first clock edge at {}", self.settings.name, position);
        Ok(())
    }

    /// One detector iteration followed by commit and progress.
    pub fn cycle(&mut self) -> WorkResult<usize> {
        if !self.started {
            self.start()?;
        }

        let emitted = self.detector.cycle(&mut self.channels, &mut self.sink)?;
        self.frames += emitted as u64;

        self.sink.commit()?;
        let position = self.channels.clock.sample_number()?;
        self.sink.report_progress(position);

        Ok(emitted)
    }

    /// Decode until the capture ends or a stop is requested.
    ///
    /// Returns the total number of frames emitted. Running out of samples or
    /// being stopped is the normal way out; any other failure is returned.
    pub fn run_to_end(&mut self) -> crate::Result<u64> {
        loop {
            match self.cycle() {
                Ok(_) => {}
                Err(e) if e.is_termination() => {
                    debug!("[{}] {}", self.settings.name, e);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(
            "[{}] decoded {} packets, {} frames",
            self.settings.name,
            self.detector.packets(),
            self.frames
        );
        Ok(self.frames)
    }
}

impl<C, S> ProcessNode for SdioAnalyzer<C, S>
where
    C: ChannelCursor + Send,
    S: FrameSink + Send,
{
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn work(&mut self) -> WorkResult<usize> {
        self.cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SdioError;
    use crate::nodes::decoders::sink::PacketCollector;
    use crate::runtime::{EdgeCursor, Sample, WorkError};
    use std::collections::VecDeque;

    type Cursor = EdgeCursor<VecDeque<Sample>>;

    fn idle(level: bool) -> Cursor {
        EdgeCursor::from_samples([Sample::new(level, 0)])
    }

    fn square(cycles: u64) -> Cursor {
        EdgeCursor::from_samples(
            (0..2 * cycles).map(|i| Sample::new(i % 2 == 0, 5 * i)),
        )
    }

    #[test]
    fn test_rejects_low_sample_rate() {
        let result = SdioAnalyzer::new(
            SdioSettings::new(1_000),
            SdioChannels::new(idle(false), idle(true)),
            PacketCollector::new(),
        );
        assert!(matches!(result, Err(SdioError::SampleRateTooLow { .. })));
    }

    #[test]
    fn test_flat_clock_ends_cleanly() {
        let mut analyzer = SdioAnalyzer::new(
            SdioSettings::new(1_000_000),
            SdioChannels::new(idle(false), idle(true)),
            PacketCollector::new(),
        )
        .unwrap();
        assert!(matches!(analyzer.cycle(), Err(WorkError::EndOfStream)));
        assert_eq!(analyzer.run_to_end().unwrap(), 0);
    }

    #[test]
    fn test_idle_bus_yields_no_packets() {
        let mut analyzer = SdioAnalyzer::new(
            SdioSettings::new(1_000_000).with_name("idle"),
            SdioChannels::new(square(20), idle(true)),
            PacketCollector::new(),
        )
        .unwrap();
        assert_eq!(analyzer.name(), "idle");
        assert_eq!(analyzer.run_to_end().unwrap(), 0);
        let sink = analyzer.into_sink();
        assert!(sink.packets().is_empty());
    }
}
