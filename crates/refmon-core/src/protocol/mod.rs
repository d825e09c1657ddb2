//! Serial Protocol Communication
//!
//! Implements the rig's newline-delimited ASCII protocol.
//!
//! Both sensor boards speak short tokens terminated by `\n`. Data arrives in
//! frames bounded by a begin/end marker pair; a handful of literal tokens
//! acknowledge diagnostic pings and are honoured in any frame state.

pub mod codec;
pub mod commands;
mod error;
pub mod frame;
pub mod schedule;
pub mod serial;
pub mod stream;

pub use codec::TokenCodec;
pub use commands::{Command, Handshake};
pub use error::{DecodeError, ProtocolError, SlotError};
pub use frame::{DecodedFrame, FrameDecoder, FrameLayout, FrameState, HandshakeFlags, Step};
pub use schedule::PollSchedule;
pub use serial::{configure_port, list_ports, open_port, PortInfo};
pub use stream::{CommunicationChannel, SerialChannel};

/// Default baud rate of the rig's microcontrollers
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default bound on a single blocking read, in milliseconds.
/// One poll iteration never waits longer than this.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1;

/// Longest token accepted before the codec discards the line
pub const MAX_TOKEN_LEN: usize = 64;
