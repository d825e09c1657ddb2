//! Protocol errors

use thiserror::Error;

/// Errors that can occur during link communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Token exceeds {max} bytes, line discarded")]
    TokenTooLong { max: usize },

    #[error("Worker thread failed: {0}")]
    WorkerFailed(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Why a single slot token could not be turned into a reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("malformed slot token '{0}'")]
    Malformed(String),

    #[error("ADC code {0} is above full scale")]
    CodeOutOfRange(u16),

    #[error("resistance {0:.1} ohm is outside the conversion table")]
    OutsideTable(f64),

    #[error("unknown status flag '{0}'")]
    UnknownStatus(char),
}

/// Errors raised while assembling or decoding a frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("slot {slot}: {reason}")]
    Slot {
        slot: usize,
        #[source]
        reason: SlotError,
    },

    #[error("frame ended after {received} of {expected} slots")]
    ShortFrame { expected: usize, received: usize },

    #[error("frame exceeded {capacity} slots, frame dropped")]
    SlotOverflow { capacity: usize },

    #[error("terminator '{0}' without a matching begin marker")]
    UnmatchedTerminator(String),

    #[error("begin marker inside an open frame, {discarded} slots discarded")]
    RestartedFrame { discarded: usize },

    #[error("frame abandoned by data request after {received} slots")]
    AbandonedFrame { received: usize },
}
