//! The set of logic channels the SDIO analyzer walks in lockstep

use crate::runtime::{ChannelCursor, WorkResult};

/// Number of SDIO data lines
pub const DATA_LINES: usize = 4;

/// Clock and command cursors plus up to four optional data-line cursors.
///
/// The clock drives every move; the other channels are only ever aligned to a
/// clock position.
pub struct SdioChannels<C> {
    pub clock: C,
    pub cmd: C,
    pub data: [Option<C>; DATA_LINES],
}

impl<C: ChannelCursor> SdioChannels<C> {
    pub fn new(clock: C, cmd: C) -> Self {
        Self {
            clock,
            cmd,
            data: [None, None, None, None],
        }
    }

    /// Attach data line `line` (0..=3). Out of range lines are ignored.
    pub fn with_data(mut self, line: usize, cursor: C) -> Self {
        if let Some(slot) = self.data.get_mut(line) {
            *slot = Some(cursor);
        }
        self
    }

    /// Number of data lines attached
    pub fn data_lines(&self) -> usize {
        self.data.iter().flatten().count()
    }

    /// Bring the command and data cursors up to `position`.
    pub fn align_to(&mut self, position: u64) -> WorkResult<()> {
        self.cmd.advance_to_position(position)?;
        for line in self.data.iter_mut().flatten() {
            line.advance_to_position(position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{EdgeCursor, Sample};
    use std::collections::VecDeque;

    fn cursor(edges: &[(bool, u64)]) -> EdgeCursor<VecDeque<Sample>> {
        EdgeCursor::from_samples(edges.iter().map(|&(v, p)| Sample::new(v, p)))
    }

    #[test]
    fn test_align_moves_cmd_and_data() {
        let mut channels = SdioChannels::new(
            cursor(&[(false, 0), (true, 5)]),
            cursor(&[(true, 0), (false, 3), (true, 8)]),
        )
        .with_data(2, cursor(&[(false, 0), (true, 4)]));
        assert_eq!(channels.data_lines(), 1);

        channels.align_to(6).unwrap();
        assert_eq!(channels.cmd.sample_number().unwrap(), 6);
        assert!(!channels.cmd.bit_state().unwrap());
        let data = channels.data[2].as_mut().unwrap();
        assert!(data.bit_state().unwrap());
        // Clock is never moved by alignment
        assert_eq!(channels.clock.sample_number().unwrap(), 0);
    }

    #[test]
    fn test_out_of_range_line_ignored() {
        let channels = SdioChannels::new(cursor(&[(false, 0)]), cursor(&[(true, 0)]))
            .with_data(DATA_LINES, cursor(&[(true, 0)]));
        assert_eq!(channels.data_lines(), 0);
    }
}
