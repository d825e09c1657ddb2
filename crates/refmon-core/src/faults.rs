//! Fault log
//!
//! Append-only record of everything that went wrong on any link, kept for
//! the operator. Records are never pruned and the decoder never reads them
//! back. Workers on different threads share one log through cheap clones.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

/// Site used for session bookkeeping records
pub const SESSION_SITE: &str = "session";

/// One fault
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultRecord {
    /// When the fault was caught
    pub timestamp: DateTime<Local>,
    /// Where it was caught, e.g. `adc::decode`
    pub site: String,
    /// Description of the error
    pub message: String,
}

/// Shared, append-only fault log
#[derive(Debug, Clone, Default)]
pub struct FaultLog {
    records: Arc<Mutex<Vec<FaultRecord>>>,
}

impl FaultLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Log opened with a session-start record
    pub fn with_session_start() -> Self {
        let log = Self::new();
        log.note("monitor session started");
        log
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FaultRecord>> {
        // push is the only mutation, so a poisoned log is still consistent
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a fault caught at `site`
    pub fn record(&self, site: impl Into<String>, error: impl Display) {
        let record = FaultRecord {
            timestamp: Local::now(),
            site: site.into(),
            message: error.to_string(),
        };
        tracing::warn!("[{}] {}", record.site, record.message);
        self.lock().push(record);
    }

    /// Append an informational session record
    pub fn note(&self, message: impl Display) {
        let record = FaultRecord {
            timestamp: Local::now(),
            site: SESSION_SITE.to_string(),
            message: message.to_string(),
        };
        tracing::info!("{}", record.message);
        self.lock().push(record);
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every record
    pub fn records(&self) -> Vec<FaultRecord> {
        self.lock().clone()
    }

    /// Copy of the records appended after the first `start`
    pub fn since(&self, start: usize) -> Vec<FaultRecord> {
        self.lock().iter().skip(start).cloned().collect()
    }

    /// Faults only, session records excluded
    pub fn faults(&self) -> Vec<FaultRecord> {
        self.lock()
            .iter()
            .filter(|r| r.site != SESSION_SITE)
            .cloned()
            .collect()
    }

    /// Export as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.lock())
    }
}
