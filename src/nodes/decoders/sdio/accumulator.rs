//! MSB-first bit accumulator shared by every field of a packet

/// Shifts in one bit per clock and counts down the bits left in a region.
///
/// `remaining` spans a whole grammar region (for example the 32-bit
/// argument), while `value` and `len` cover just the field being collected.
/// Nested fields close on `remaining` thresholds and call [`take`](Self::take),
/// which restarts the field without touching the region count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitAccumulator {
    value: u64,
    len: u8,
    remaining: u32,
}

impl BitAccumulator {
    /// Start a new region of `bits` bits with an empty field.
    pub fn start(&mut self, bits: u32) {
        self.value = 0;
        self.len = 0;
        self.remaining = bits;
    }

    /// Shift in one bit. Returns true when the region is exhausted.
    pub fn push(&mut self, bit: bool) -> bool {
        self.value = (self.value << 1) | u64::from(bit);
        self.len = self.len.saturating_add(1);
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    /// Append a zero for a bit that is never sampled.
    pub fn pad(&mut self) {
        self.value <<= 1;
        self.len = self.len.saturating_add(1);
    }

    /// Return the field value and start a new field.
    pub fn take(&mut self) -> u64 {
        let value = self.value;
        self.value = 0;
        self.len = 0;
        value
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Bits in the current field
    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits left in the region
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_first() {
        let mut acc = BitAccumulator::default();
        acc.start(6);
        let bits = [true, true, false, true, false, false];
        let done: Vec<bool> = bits.iter().map(|&b| acc.push(b)).collect();
        assert_eq!(done, vec![false, false, false, false, false, true]);
        assert_eq!(acc.value(), 0b110100);
        assert_eq!(acc.len(), 6);
    }

    #[test]
    fn test_take_keeps_region_count() {
        let mut acc = BitAccumulator::default();
        acc.start(32);
        acc.push(true);
        acc.push(false);
        assert_eq!(acc.take(), 0b10);
        assert!(acc.is_empty());
        assert_eq!(acc.remaining(), 30);
        acc.push(true);
        assert_eq!(acc.value(), 1);
    }

    #[test]
    fn test_pad_appends_zero() {
        let mut acc = BitAccumulator::default();
        acc.start(4);
        acc.push(true);
        acc.push(true);
        acc.pad();
        assert_eq!(acc.value(), 0b110);
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.remaining(), 2);
    }

    #[test]
    fn test_push_keeps_64_most_recent_bits() {
        let mut acc = BitAccumulator::default();
        acc.start(70);
        for i in 0..70 {
            acc.push(i == 0);
        }
        assert_eq!(acc.value(), 0);
        assert_eq!(acc.remaining(), 0);
    }
}
