//! Outbound command cadence
//!
//! The ADC board is driven by a counter advanced once per poll iteration.
//! A data request goes out part-way through each cycle, ping 1 after it
//! (skipped while a frame is being collected), and ping 2 closes the cycle
//! and restarts the count.
//!
//! The firmware timing was set against a host loop that polled the port
//! without blocking: `dreq` after 100 000 polls, `b1` after 200 000. A
//! worker iteration here is one read bounded by the 1 ms poll timeout, which
//! spans about [`POLLS_PER_ITERATION`] of those non-blocking polls, so the
//! reference counts are divided down to keep the same wall-clock cadence.

use super::Command;

/// Non-blocking polls of the reference host loop before the data request
pub const REFERENCE_DATA_REQUEST_POLLS: u32 = 100_000;
/// Non-blocking polls of the reference host loop before ping 1
pub const REFERENCE_PING1_POLLS: u32 = 200_000;
/// Reference polls covered by one bounded read
pub const POLLS_PER_ITERATION: u32 = 100;

/// Poll iterations before the data request
pub const DATA_REQUEST_AT: u32 = REFERENCE_DATA_REQUEST_POLLS / POLLS_PER_ITERATION;
/// Poll iterations before ping 1
pub const PING1_AT: u32 = REFERENCE_PING1_POLLS / POLLS_PER_ITERATION;
/// Poll iterations before ping 2; the counter restarts here.
/// Half a data interval after ping 1 so the two replies never overlap.
pub const PING2_AT: u32 = PING1_AT + DATA_REQUEST_AT / 2;

/// Poll-iteration counter issuing the periodic commands
#[derive(Debug, Clone, Default)]
pub struct PollSchedule {
    counter: u32,
}

impl PollSchedule {
    /// Schedule starting a fresh cycle
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Current position inside the cycle
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance one poll iteration and return the command due, if any.
    ///
    /// `collecting` reports whether a frame is currently open; ping 1 is
    /// withheld so the acknowledgement cannot land inside a data frame.
    pub fn tick(&mut self, collecting: bool) -> Option<Command> {
        self.counter += 1;
        match self.counter {
            DATA_REQUEST_AT => Some(Command::DataRequest),
            PING1_AT if !collecting => Some(Command::Ping1),
            c if c >= PING2_AT => {
                self.counter = 0;
                Some(Command::Ping2)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_cycle(schedule: &mut PollSchedule, collecting: bool) -> Vec<(u32, Command)> {
        (1..=PING2_AT)
            .filter_map(|i| schedule.tick(collecting).map(|c| (i, c)))
            .collect()
    }

    #[test]
    fn test_cycle_order() {
        let mut schedule = PollSchedule::new();
        assert_eq!(
            run_cycle(&mut schedule, false),
            vec![
                (DATA_REQUEST_AT, Command::DataRequest),
                (PING1_AT, Command::Ping1),
                (PING2_AT, Command::Ping2),
            ]
        );
        assert_eq!(schedule.counter(), 0);
    }

    #[test]
    fn test_thresholds_follow_reference_timing() {
        assert_eq!(DATA_REQUEST_AT, 1_000);
        assert_eq!(PING1_AT, 2_000);
        assert_eq!(PING2_AT, 2_500);
        assert_eq!(DATA_REQUEST_AT * POLLS_PER_ITERATION, REFERENCE_DATA_REQUEST_POLLS);
        assert_eq!(PING1_AT * POLLS_PER_ITERATION, REFERENCE_PING1_POLLS);
    }

    #[test]
    fn test_steady_state_cadence() {
        let mut schedule = PollSchedule::new();
        let commands: Vec<(u32, Command)> = (1..=2 * PING2_AT)
            .filter_map(|i| schedule.tick(false).map(|c| (i, c)))
            .collect();
        assert_eq!(
            commands,
            vec![
                (1_000, Command::DataRequest),
                (2_000, Command::Ping1),
                (2_500, Command::Ping2),
                (3_500, Command::DataRequest),
                (4_500, Command::Ping1),
                (5_000, Command::Ping2),
            ]
        );
    }

    #[test]
    fn test_ping1_withheld_while_collecting() {
        let mut schedule = PollSchedule::new();
        let cycle = run_cycle(&mut schedule, true);
        assert!(cycle.iter().all(|(_, c)| *c != Command::Ping1));
        // The cycle still closes so pings resume afterwards
        assert_eq!(cycle.last(), Some(&(PING2_AT, Command::Ping2)));
        assert!(run_cycle(&mut schedule, false).contains(&(PING1_AT, Command::Ping1)));
    }
}
