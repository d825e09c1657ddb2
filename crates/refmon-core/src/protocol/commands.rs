//! Protocol tokens
//!
//! Outbound requests written to the ADC board and the inbound handshake
//! replies it answers with. Every token travels as one `\n`-terminated line.

use crate::heater::HeaterCommand;

/// Ping 1 request
pub const PING1: &str = "b1";
/// Ping 2 request
pub const PING2: &str = "b2";
/// Data fetch request
pub const DATA_REQUEST: &str = "dreq";

/// Ping 1 acknowledged
pub const PING1_ACK: &str = "b1c";
/// Ping 2 partially acknowledged
pub const PING2_PARTIAL_ACK: &str = "b2c";
/// Ping 2 fully acknowledged
pub const PING2_FULL_ACK: &str = "b2n";

/// A command written to a microcontroller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `b1` - ping 1
    Ping1,
    /// `b2` - ping 2
    Ping2,
    /// `dreq` - ask the board for a data frame
    DataRequest,
    /// Heater power level on the heater link
    Heater(HeaterCommand),
}

impl Command {
    /// Line written to the wire, terminator included
    pub fn to_wire(&self) -> String {
        match self {
            Command::Ping1 => format!("{PING1}\n"),
            Command::Ping2 => format!("{PING2}\n"),
            Command::DataRequest => format!("{DATA_REQUEST}\n"),
            Command::Heater(cmd) => cmd.to_wire(),
        }
    }
}

/// Handshake reply recognised in any frame state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// `b1c`
    Ping1Ack,
    /// `b2c`
    Ping2PartialAck,
    /// `b2n`
    Ping2FullAck,
}

impl Handshake {
    /// Match a trimmed token against the handshake replies
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            PING1_ACK => Some(Handshake::Ping1Ack),
            PING2_PARTIAL_ACK => Some(Handshake::Ping2PartialAck),
            PING2_FULL_ACK => Some(Handshake::Ping2FullAck),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(Command::Ping1.to_wire(), "b1\n");
        assert_eq!(Command::Ping2.to_wire(), "b2\n");
        assert_eq!(Command::DataRequest.to_wire(), "dreq\n");
    }

    #[test]
    fn test_handshake_tokens_are_exact() {
        assert_eq!(Handshake::from_token("b1c"), Some(Handshake::Ping1Ack));
        assert_eq!(Handshake::from_token("b2c"), Some(Handshake::Ping2PartialAck));
        assert_eq!(Handshake::from_token("b2n"), Some(Handshake::Ping2FullAck));
        assert_eq!(Handshake::from_token("b1"), None);
        assert_eq!(Handshake::from_token("B1C"), None);
        assert_eq!(Handshake::from_token("b1cc"), None);
    }
}
