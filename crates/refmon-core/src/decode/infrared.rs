//! Infrared camera board frames
//!
//! `begin`, thirty-six slot tokens, `end`. A slot is `FSTTTT`:
//! - `F` status digit (0 normal, 1 too cold, 2 too hot)
//! - `S` sign digit (0 positive, anything else negative)
//! - `TTTT` magnitude in tenths of a degree
//!
//! Firmware revisions that separate the fields with spaces (`F S TTTT`) and
//! magnitudes that carry their own decimal point are accepted as well. Slot
//! order is channel order.

use crate::protocol::{DecodeError, DecodedFrame, FrameLayout, SlotError};
use crate::readings::{InfraredFrame, InfraredReading, ThermalStatus, LOGICAL_CHANNELS};

/// Slots per infrared frame
pub const INFRARED_SLOTS: usize = LOGICAL_CHANNELS;

/// Infrared board layout
#[derive(Debug, Clone, Copy, Default)]
pub struct InfraredLayout;

impl FrameLayout for InfraredLayout {
    type Frame = InfraredFrame;

    const NAME: &'static str = "infrared";
    const BEGIN: &'static str = "begin";
    const END: &'static str = "end";
    const CAPACITY: usize = INFRARED_SLOTS;

    fn decode(&self, slots: &[String]) -> DecodedFrame<InfraredFrame> {
        let mut errors = Vec::new();
        if slots.len() < INFRARED_SLOTS {
            errors.push(DecodeError::ShortFrame {
                expected: INFRARED_SLOTS,
                received: slots.len(),
            });
        }

        let mut frame = InfraredFrame::default();
        for (slot, token) in slots.iter().take(INFRARED_SLOTS).enumerate() {
            match parse_infrared_slot(token) {
                Ok(reading) => frame.channels[slot] = Some(reading),
                Err(reason) => errors.push(DecodeError::Slot { slot, reason }),
            }
        }

        DecodedFrame { frame, errors }
    }
}

/// Decode one `FSTTTT` slot token
pub fn parse_infrared_slot(token: &str) -> Result<InfraredReading, SlotError> {
    let token = token.trim();
    let malformed = || SlotError::Malformed(token.to_string());

    let (status, sign, magnitude) = if token.contains(char::is_whitespace) {
        let mut fields = token.split_whitespace();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(f), Some(s), Some(m), None) if f.len() == 1 && s.len() == 1 => {
                (single_char(f), single_char(s), m)
            }
            _ => return Err(malformed()),
        }
    } else {
        let mut chars = token.chars();
        let (Some(f), Some(s)) = (chars.next(), chars.next()) else {
            return Err(malformed());
        };
        (f, s, chars.as_str())
    };

    if !status.is_ascii_digit() || !sign.is_ascii_digit() {
        return Err(malformed());
    }
    let status = ThermalStatus::from_digit(status).ok_or(SlotError::UnknownStatus(status))?;
    let magnitude = parse_magnitude(magnitude).ok_or_else(malformed)?;
    let celsius = if sign == '0' { magnitude } else { -magnitude };

    Ok(InfraredReading { status, celsius })
}

fn single_char(field: &str) -> char {
    field.chars().next().unwrap_or_default()
}

fn parse_magnitude(field: &str) -> Option<f64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    if field.contains('.') {
        field.parse::<f64>().ok()
    } else {
        field.parse::<u32>().ok().map(|tenths| f64::from(tenths) / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_slot() {
        let r = parse_infrared_slot("000250").unwrap();
        assert_eq!(r.status, ThermalStatus::Normal);
        assert_eq!(r.celsius, 25.0);

        let r = parse_infrared_slot("110125").unwrap();
        assert_eq!(r.status, ThermalStatus::TooCold);
        assert_eq!(r.celsius, -12.5);

        let r = parse_infrared_slot("201234").unwrap();
        assert_eq!(r.status, ThermalStatus::TooHot);
        assert_eq!(r.celsius, 123.4);
    }

    #[test]
    fn test_spaced_slot() {
        let r = parse_infrared_slot("0 0 0250").unwrap();
        assert_eq!(r.celsius, 25.0);
        let r = parse_infrared_slot("2 1 25.5").unwrap();
        assert_eq!(r.status, ThermalStatus::TooHot);
        assert_eq!(r.celsius, -25.5);
    }

    #[test]
    fn test_bad_slots() {
        assert_eq!(parse_infrared_slot("300250"), Err(SlotError::UnknownStatus('3')));
        assert!(matches!(parse_infrared_slot("00"), Err(SlotError::Malformed(_))));
        assert!(matches!(parse_infrared_slot("0"), Err(SlotError::Malformed(_))));
        assert!(matches!(parse_infrared_slot("00x250"), Err(SlotError::Malformed(_))));
        assert!(matches!(parse_infrared_slot("0 0"), Err(SlotError::Malformed(_))));
        assert!(matches!(parse_infrared_slot("a00250"), Err(SlotError::Malformed(_))));
    }
}
