//! Data Logging
//!
//! Keeps the consumer-side history of decoded frames and writes it to disk.
//! The decoder itself retains nothing; each refresh of the display appends
//! one entry here.

mod format;
mod recorder;

pub use format::{format_value, write_csv, write_text_line, ContinuousLog, LogFormat};
pub use recorder::{grid_channel_names, DataLogger};

use chrono::{DateTime, Local};
use serde::Serialize;

/// One sample of every logical channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Sample number since recording started
    pub index: u64,
    /// Wall-clock time of the sample
    pub timestamp: DateTime<Local>,
    /// Temperature per logical channel
    pub values: Vec<Option<f64>>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(index: u64, timestamp: DateTime<Local>, values: Vec<Option<f64>>) -> Self {
        Self {
            index,
            timestamp,
            values,
        }
    }
}
