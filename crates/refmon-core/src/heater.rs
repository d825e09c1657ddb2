//! Heater power commands
//!
//! The heater controller listens on its own serial link for lines of the form
//! `"NN P\n"`: a two-digit channel index, a space, and a power level in
//! percent. The rig has six trays with two heaters each; tray `t` (0-based)
//! heater `h` (0 or 1) is channel `2 * t + h`.

use bytes::BytesMut;
use std::io::Write;
use thiserror::Error;
use tokio_util::codec::Encoder;

use crate::faults::FaultLog;
use crate::protocol::{Command, CommunicationChannel, ProtocolError, TokenCodec};

/// Trays on the rig
pub const TRAYS: usize = 6;
/// Heaters per tray
pub const HEATERS_PER_TRAY: usize = 2;
/// Addressable heater channels
pub const HEATER_CHANNELS: usize = TRAYS * HEATERS_PER_TRAY;
/// Highest channel index the two-digit field can carry
pub const MAX_CHANNEL_INDEX: u8 = 99;

/// Invalid heater command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaterError {
    #[error("heater channel {0} does not fit the two-digit field")]
    ChannelOutOfRange(u8),

    #[error("heater power {0}% is above 100%")]
    PercentOutOfRange(u8),

    #[error("tray {tray} heater {heater} does not exist")]
    NoSuchHeater { tray: usize, heater: usize },
}

/// One power-level command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaterCommand {
    channel: u8,
    percent: u8,
}

impl HeaterCommand {
    /// Validated command
    pub fn new(channel: u8, percent: u8) -> Result<Self, HeaterError> {
        if channel > MAX_CHANNEL_INDEX {
            return Err(HeaterError::ChannelOutOfRange(channel));
        }
        if percent > 100 {
            return Err(HeaterError::PercentOutOfRange(percent));
        }
        Ok(Self { channel, percent })
    }

    /// Command addressing a tray's heater
    pub fn for_tray(tray: usize, heater: usize, percent: u8) -> Result<Self, HeaterError> {
        if tray >= TRAYS || heater >= HEATERS_PER_TRAY {
            return Err(HeaterError::NoSuchHeater { tray, heater });
        }
        Self::new((tray * HEATERS_PER_TRAY + heater) as u8, percent)
    }

    /// Channel index
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Power level in percent
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Line written to the wire
    pub fn to_wire(&self) -> String {
        format!("{:02} {}\n", self.channel, self.percent)
    }
}

/// Last confirmed level of every heater
///
/// A command is only produced when a confirmed level differs from the one
/// already sent, so repeated confirmations do not flood the link.
#[derive(Debug, Clone, Default)]
pub struct HeaterBank {
    levels: [u8; HEATER_CHANNELS],
}

impl HeaterBank {
    /// All heaters off
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a tray's heater
    pub fn level(&self, tray: usize, heater: usize) -> Option<u8> {
        if tray >= TRAYS || heater >= HEATERS_PER_TRAY {
            return None;
        }
        Some(self.levels[tray * HEATERS_PER_TRAY + heater])
    }

    /// Confirm a new level; returns the command to send if it changed
    pub fn confirm(
        &mut self,
        tray: usize,
        heater: usize,
        percent: u8,
    ) -> Result<Option<HeaterCommand>, HeaterError> {
        let cmd = HeaterCommand::for_tray(tray, heater, percent)?;
        let slot = &mut self.levels[cmd.channel() as usize];
        if *slot == percent {
            return Ok(None);
        }
        *slot = percent;
        Ok(Some(cmd))
    }
}

/// Write side of the heater controller link
pub struct HeaterLink {
    channel: Box<dyn CommunicationChannel>,
    codec: TokenCodec,
    faults: FaultLog,
}

impl HeaterLink {
    /// Wrap an opened channel
    pub fn new(channel: Box<dyn CommunicationChannel>, faults: FaultLog) -> Self {
        Self {
            channel,
            codec: TokenCodec::new(),
            faults,
        }
    }

    /// Send one command; failures are also appended to the fault log
    pub fn send(&mut self, cmd: HeaterCommand) -> Result<(), ProtocolError> {
        let result = self.write_command(cmd);
        if let Err(e) = &result {
            self.faults.record("heater::write", e);
        } else {
            tracing::debug!("heater: sent {:?}", cmd.to_wire().trim_end());
        }
        result
    }

    fn write_command(&mut self, cmd: HeaterCommand) -> Result<(), ProtocolError> {
        let mut out = BytesMut::new();
        self.codec.encode(Command::Heater(cmd), &mut out)?;
        self.channel.write_all(&out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(HeaterCommand::new(3, 45).unwrap().to_wire(), "03 45\n");
        assert_eq!(HeaterCommand::new(11, 100).unwrap().to_wire(), "11 100\n");
        assert_eq!(HeaterCommand::new(0, 0).unwrap().to_wire(), "00 0\n");
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            HeaterCommand::new(100, 10),
            Err(HeaterError::ChannelOutOfRange(100))
        );
        assert_eq!(
            HeaterCommand::new(1, 101),
            Err(HeaterError::PercentOutOfRange(101))
        );
        assert_eq!(
            HeaterCommand::for_tray(6, 0, 10),
            Err(HeaterError::NoSuchHeater { tray: 6, heater: 0 })
        );
        assert_eq!(HeaterCommand::for_tray(5, 1, 10).unwrap().channel(), 11);
    }

    #[test]
    fn test_bank_sends_only_changes() {
        let mut bank = HeaterBank::new();
        let cmd = bank.confirm(2, 1, 60).unwrap().unwrap();
        assert_eq!(cmd.to_wire(), "05 60\n");
        assert_eq!(bank.confirm(2, 1, 60).unwrap(), None);
        assert_eq!(bank.level(2, 1), Some(60));
        assert!(bank.confirm(2, 1, 0).unwrap().is_some());
    }
}
