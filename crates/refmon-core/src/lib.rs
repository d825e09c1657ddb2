//! # RefMon Core Library
//!
//! Serial decoding for the thermal-simulation reference rig monitor.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Newline-token framing for the rig's ASCII serial links
//! - Frame state machines for the thermistor (ADC) and infrared boards
//! - Thermistor conversions (Beta equation and resistance table)
//! - Link workers publishing versioned snapshots
//! - Heater power commands, diagnostics and data logging
//!
//! ## Example
//!
//! ```rust,ignore
//! use refmon_core::prelude::*;
//!
//! let faults = FaultLog::new();
//! let channel = open_link(&LinkConfig::new("/dev/ttyACM0"))?;
//! let link = spawn_link(
//!     AdcLayout::new(ConversionScheme::Beta),
//!     channel,
//!     Some(PollSchedule::new()),
//!     faults.clone(),
//! )?;
//!
//! let snapshot = link.snapshot();
//! println!("channel 1: {:?}", snapshot.frame.channels[0]);
//! ```

pub mod config;
pub mod datalog;
pub mod decode;
pub mod demo;
pub mod diagnostics;
pub mod faults;
pub mod heater;
pub mod link;
pub mod protocol;
pub mod readings;
pub mod thermistor;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{LinkConfig, MonitorConfig};
    pub use crate::datalog::{DataLogger, LogEntry, LogFormat};
    pub use crate::decode::{AdcLayout, InfraredLayout};
    pub use crate::diagnostics::{run_diagnostics, CheckOutcome, DiagnosticReport};
    pub use crate::faults::{FaultLog, FaultRecord};
    pub use crate::heater::{HeaterBank, HeaterCommand, HeaterLink};
    pub use crate::link::{open_link, spawn_link, LinkHandle, LinkSnapshot, LinkStatus};
    pub use crate::protocol::{DecodeError, FrameDecoder, HandshakeFlags, PollSchedule, ProtocolError};
    pub use crate::readings::{AdcFrame, InfraredFrame, InfraredReading, ThermalStatus};
    pub use crate::thermistor::ConversionScheme;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
