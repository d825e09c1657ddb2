//! Link diagnostics
//!
//! The operator's connection test. Each check reads the latest snapshot of a
//! link; none of them talk to the hardware directly, so results reflect the
//! most recent ping cycle.

use serde::Serialize;

use crate::link::{LinkSnapshot, LinkStatus};
use crate::readings::{TemperatureFrame, LOGICAL_CHANNELS};

/// Result of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckOutcome {
    /// Check passed
    Pass,
    /// Some sensors responded
    Partial,
    /// Check failed
    Fail,
}

impl CheckOutcome {
    fn from_bool(ok: bool) -> Self {
        if ok {
            CheckOutcome::Pass
        } else {
            CheckOutcome::Fail
        }
    }

    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Pass => "GOOD CONNECTION",
            CheckOutcome::Partial => "PARTIAL SUCCESS",
            CheckOutcome::Fail => "NO CONNECTION",
        }
    }
}

/// Outcome of every check for one link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// Serial port is open and polled
    pub serial_input: CheckOutcome,
    /// Monitor board answered ping 1
    pub monitor_connection: CheckOutcome,
    /// Microcontroller input side answered ping 2
    pub mcu_inputs: CheckOutcome,
    /// Microcontroller output side fully answered ping 2
    pub mcu_outputs: CheckOutcome,
    /// Wired sensors reporting a temperature
    pub wired_sensors: CheckOutcome,
}

impl DiagnosticReport {
    /// Checks in the order they are presented
    pub fn checks(&self) -> [(&'static str, CheckOutcome); 5] {
        [
            ("Monitor serial input", self.serial_input),
            ("Monitor connection", self.monitor_connection),
            ("MCU input connections", self.mcu_inputs),
            ("MCU output connections", self.mcu_outputs),
            ("Wired connections", self.wired_sensors),
        ]
    }

    /// Whether every check passed
    pub fn all_passed(&self) -> bool {
        self.checks().iter().all(|(_, o)| *o == CheckOutcome::Pass)
    }
}

/// Run every check against a link snapshot
pub fn run_diagnostics<F: TemperatureFrame>(snapshot: &LinkSnapshot<F>) -> DiagnosticReport {
    DiagnosticReport {
        serial_input: CheckOutcome::from_bool(snapshot.status == LinkStatus::Open),
        monitor_connection: CheckOutcome::from_bool(snapshot.flags.ping1_ack),
        mcu_inputs: CheckOutcome::from_bool(snapshot.flags.ping2_ack),
        mcu_outputs: CheckOutcome::from_bool(snapshot.flags.ping2_secondary_ack),
        wired_sensors: sensor_coverage(&snapshot.frame),
    }
}

/// All, some or none of the wired channels carry a reading
pub fn sensor_coverage<F: TemperatureFrame>(frame: &F) -> CheckOutcome {
    let wired = frame.wired_channels().min(LOGICAL_CHANNELS);
    let present = frame
        .temperatures()
        .iter()
        .take(wired)
        .filter(|t| t.is_some())
        .count();
    if present == 0 {
        CheckOutcome::Fail
    } else if present == wired {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Partial
    }
}
