use pretty_assertions::assert_eq;
use refmon_core::decode::{parse_infrared_slot, InfraredLayout, INFRARED_SLOTS};
use refmon_core::protocol::{DecodeError, FrameDecoder, SlotError, Step};
use refmon_core::readings::{InfraredReading, TemperatureFrame, ThermalStatus};

#[test]
fn test_slot_forms() {
    assert_eq!(
        parse_infrared_slot("000250").unwrap(),
        InfraredReading {
            status: ThermalStatus::Normal,
            celsius: 25.0
        }
    );
    assert_eq!(
        parse_infrared_slot("110125").unwrap(),
        InfraredReading {
            status: ThermalStatus::TooCold,
            celsius: -12.5
        }
    );
    assert_eq!(
        parse_infrared_slot("2 0 0712").unwrap(),
        InfraredReading {
            status: ThermalStatus::TooHot,
            celsius: 71.2
        }
    );
}

#[test]
fn test_bad_slots() {
    assert_eq!(
        parse_infrared_slot("300250"),
        Err(SlotError::UnknownStatus('3'))
    );
    assert!(matches!(
        parse_infrared_slot("0"),
        Err(SlotError::Malformed(_))
    ));
    assert!(matches!(
        parse_infrared_slot("00ab"),
        Err(SlotError::Malformed(_))
    ));
}

#[test]
fn test_frame_is_in_channel_order() {
    let mut decoder = FrameDecoder::new(InfraredLayout);
    decoder.feed("begin").unwrap();
    for i in 0..INFRARED_SLOTS {
        decoder.feed(&format!("00{:04}", 200 + i)).unwrap();
    }
    let Some(Step::Frame(decoded)) = decoder.feed("end").unwrap() else {
        panic!("frame not completed");
    };

    assert!(decoded.errors.is_empty());
    let temps = decoded.frame.temperatures();
    assert_eq!(temps[0], Some(20.0));
    assert_eq!(temps[35], Some(23.5));
    assert_eq!(decoded.frame.readings().len(), INFRARED_SLOTS);
}

#[test]
fn test_bad_slot_is_reported_alone() {
    let mut decoder = FrameDecoder::new(InfraredLayout);
    decoder.feed("begin").unwrap();
    for i in 0..INFRARED_SLOTS {
        let token = if i == 4 { "0x0250" } else { "000250" };
        decoder.feed(token).unwrap();
    }
    let Some(Step::Frame(decoded)) = decoder.feed("end").unwrap() else {
        panic!("frame not completed");
    };

    assert_eq!(decoded.errors.len(), 1);
    assert!(matches!(decoded.errors[0], DecodeError::Slot { slot: 4, .. }));
    assert_eq!(decoded.frame.channels[4], None);
    assert_eq!(decoded.frame.readings().len(), INFRARED_SLOTS - 1);
}

#[test]
fn test_adc_markers_are_not_infrared_markers() {
    let mut decoder = FrameDecoder::new(InfraredLayout);
    assert!(decoder.feed("begd").unwrap().is_none());
    assert!(!decoder.is_collecting());
}
