//! Thermistor (ADC) board frames
//!
//! `begd`, forty 4-digit ADC codes, `endd`. Each code is converted on its
//! own, then slots 16/18 and 17/19 are exchanged (two sensor pairs are wired
//! crossed on the board), then the 40 raw slots are folded onto the 36-slot
//! logical grid in five blocks of eight.
//!
//! The block destinations overlap by two slots and are written in order, so
//! each later block overwrites the tail of the previous one. Raw slots
//! 6, 7, 14, 15, 22, 23, 30 and 31 never reach the grid, and logical slots
//! 32..36 stay empty. This matches what the rig's existing tooling shows.

use crate::protocol::{DecodeError, DecodedFrame, FrameLayout, SlotError};
use crate::readings::{AdcFrame, LOGICAL_CHANNELS};
use crate::thermistor::ConversionScheme;

/// Raw slots per ADC frame
pub const ADC_SLOTS: usize = 40;

/// Crossed sensor pairs, exchanged before remapping
pub const SLOT_SWAPS: [(usize, usize); 2] = [(16, 18), (17, 19)];

/// Width of a remap block
pub const REMAP_BLOCK_LEN: usize = 8;

/// `(raw start, logical start)` of each block, applied in order
pub const REMAP_BLOCKS: [(usize, usize); 5] = [(0, 0), (8, 6), (16, 12), (24, 18), (32, 24)];

/// Logical channels the remap can populate
pub const ADC_MAPPED_CHANNELS: usize = REMAP_BLOCKS[REMAP_BLOCKS.len() - 1].1 + REMAP_BLOCK_LEN;

/// ADC board layout
#[derive(Debug, Clone, Copy, Default)]
pub struct AdcLayout {
    scheme: ConversionScheme,
}

impl AdcLayout {
    /// Layout converting with the given scheme
    pub fn new(scheme: ConversionScheme) -> Self {
        Self { scheme }
    }

    /// Conversion scheme in use
    pub fn scheme(&self) -> ConversionScheme {
        self.scheme
    }

    fn decode_slot(&self, token: &str) -> Result<Option<f64>, SlotError> {
        let code = parse_adc_code(token)?;
        self.scheme.temperature(code)
    }
}

impl FrameLayout for AdcLayout {
    type Frame = AdcFrame;

    const NAME: &'static str = "adc";
    const BEGIN: &'static str = "begd";
    const END: &'static str = "endd";
    const CAPACITY: usize = ADC_SLOTS;

    fn decode(&self, slots: &[String]) -> DecodedFrame<AdcFrame> {
        let mut errors = Vec::new();
        if slots.len() < ADC_SLOTS {
            errors.push(DecodeError::ShortFrame {
                expected: ADC_SLOTS,
                received: slots.len(),
            });
        }

        let mut raw = [None; ADC_SLOTS];
        for (slot, token) in slots.iter().take(ADC_SLOTS).enumerate() {
            match self.decode_slot(token) {
                Ok(value) => raw[slot] = value,
                Err(reason) => errors.push(DecodeError::Slot { slot, reason }),
            }
        }

        apply_slot_swaps(&mut raw);
        let channels = remap_slots(&raw).into_iter().map(Option::flatten).collect();

        DecodedFrame {
            frame: AdcFrame { channels },
            errors,
        }
    }
}

/// Parse a slot token as a 4-digit ADC code
pub fn parse_adc_code(token: &str) -> Result<u16, SlotError> {
    let token = token.trim();
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SlotError::Malformed(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| SlotError::Malformed(token.to_string()))
}

/// Exchange the crossed sensor pairs in place
pub fn apply_slot_swaps<T>(raw: &mut [T; ADC_SLOTS]) {
    for (a, b) in SLOT_SWAPS {
        raw.swap(a, b);
    }
}

/// Fold the raw slots onto the logical grid, later blocks winning overlaps
pub fn remap_slots<T: Copy>(raw: &[T; ADC_SLOTS]) -> [Option<T>; LOGICAL_CHANNELS] {
    let mut out = [None; LOGICAL_CHANNELS];
    for (src, dst) in REMAP_BLOCKS {
        for i in 0..REMAP_BLOCK_LEN {
            out[dst + i] = Some(raw[src + i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adc_code() {
        assert_eq!(parse_adc_code("0000"), Ok(0));
        assert_eq!(parse_adc_code("1456"), Ok(1456));
        assert_eq!(parse_adc_code(" 0042 "), Ok(42));
        assert!(parse_adc_code("123").is_err());
        assert!(parse_adc_code("12a4").is_err());
        assert!(parse_adc_code("+123").is_err());
        assert!(parse_adc_code("01234").is_err());
    }

    #[test]
    fn test_swaps_are_pairwise() {
        let mut raw: [usize; ADC_SLOTS] = std::array::from_fn(|i| i);
        apply_slot_swaps(&mut raw);
        assert_eq!(&raw[15..21], &[15, 18, 19, 16, 17, 20]);
    }
}
