//! Analyzer settings

use crate::SdioError;

/// Lowest capture rate that can resolve a 400 kHz identification-mode clock
/// with margin.
pub const MIN_SAMPLE_RATE_HZ: u64 = 25_000;

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdioSettings {
    /// Capture sample rate
    pub sample_rate_hz: u64,
    /// Place an up-arrow marker on the clock at every sampled rising edge
    pub clock_markers: bool,
    /// Node name reported to the scheduler
    pub name: String,
}

impl SdioSettings {
    pub fn new(sample_rate_hz: u64) -> Self {
        Self {
            sample_rate_hz,
            clock_markers: true,
            name: "sdio_decoder".to_string(),
        }
    }

    /// Enable or disable clock markers
    pub fn with_clock_markers(mut self, enabled: bool) -> Self {
        self.clock_markers = enabled;
        self
    }

    /// With custom name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reject sample rates too low to decode.
    pub fn validate(&self) -> crate::Result<()> {
        if self.sample_rate_hz < MIN_SAMPLE_RATE_HZ {
            return Err(SdioError::SampleRateTooLow {
                rate: self.sample_rate_hz,
                minimum: MIN_SAMPLE_RATE_HZ,
            });
        }
        Ok(())
    }

    /// Minimum sample rate the analyzer accepts, independent of the capture
    pub fn minimum_sample_rate_hz(&self) -> u64 {
        MIN_SAMPLE_RATE_HZ
    }
}
