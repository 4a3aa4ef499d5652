//! Run-length encoded logic samples

use std::fmt;

/// A logic level that holds from `position` until the next sample.
///
/// Producers only send a sample when the level changes, so a channel idling
/// for millions of samples costs one message. A sample repeating the previous
/// level is harmless and is not treated as an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub value: bool,
    /// Absolute sample index on the capture timeline
    pub position: u64,
}

impl Sample {
    pub fn new(value: bool, position: u64) -> Self {
        Self { value, position }
    }

    /// Whether this sample changes the level set by `previous`.
    pub fn is_edge_after(&self, previous: &Sample) -> bool {
        self.value != previous.value
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", if self.value { "H" } else { "L" }, self.position)
    }
}
