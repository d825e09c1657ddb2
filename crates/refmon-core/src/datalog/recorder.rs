//! Data logger / recorder

use chrono::Local;
use std::collections::VecDeque;

use super::LogEntry;
use crate::readings::LOGICAL_CHANNELS;

/// Maximum entries kept in memory; older ones are dropped first
const MAX_BUFFER_SIZE: usize = 10000;

/// Channel names as the rig labels them: `Grid-01` .. `Grid-36`
pub fn grid_channel_names() -> Vec<String> {
    (1..=LOGICAL_CHANNELS).map(|i| format!("Grid-{i:02}")).collect()
}

/// Data logger state
pub struct DataLogger {
    /// Channel names
    channels: Vec<String>,
    /// In-memory log buffer
    buffer: VecDeque<LogEntry>,
    /// Whether logging is active
    is_recording: bool,
    /// Index given to the next sample
    next_index: u64,
}

impl DataLogger {
    /// Create a new data logger with the given channels
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            buffer: VecDeque::with_capacity(MAX_BUFFER_SIZE),
            is_recording: false,
            next_index: 0,
        }
    }

    /// Logger over the 36 grid channels
    pub fn for_grid() -> Self {
        Self::new(grid_channel_names())
    }

    /// Start recording from sample 0
    pub fn start(&mut self) {
        self.is_recording = true;
        self.next_index = 0;
        self.buffer.clear();
    }

    /// Stop recording
    pub fn stop(&mut self) {
        self.is_recording = false;
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Record a sample, returning the stored entry
    pub fn record(&mut self, values: Vec<Option<f64>>) -> Option<&LogEntry> {
        if !self.is_recording {
            return None;
        }

        let entry = LogEntry::new(self.next_index, Local::now(), values);
        self.next_index += 1;

        if self.buffer.len() >= MAX_BUFFER_SIZE {
            self.buffer.pop_front();
        }
        self.buffer.push_back(entry);
        self.buffer.back()
    }

    /// Get the number of recorded entries
    pub fn entry_count(&self) -> usize {
        self.buffer.len()
    }

    /// Get all entries
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.buffer.iter()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&LogEntry> {
        self.buffer.back()
    }

    /// History of one channel (0-based), oldest first
    pub fn channel_history(&self, channel: usize) -> Vec<Option<f64>> {
        self.buffer
            .iter()
            .map(|e| e.values.get(channel).copied().flatten())
            .collect()
    }

    /// Get the channel names
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Clear all recorded data
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.next_index = 0;
    }
}

impl Default for DataLogger {
    fn default() -> Self {
        Self::for_grid()
    }
}
