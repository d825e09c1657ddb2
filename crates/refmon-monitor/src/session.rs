//! Data logging for one monitor session
//!
//! Samples are buffered in a [`DataLogger`]. With continuous recording each
//! sample is also appended to a text log as it arrives; otherwise the buffer
//! is written out as CSV when the session ends.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use refmon_core::datalog::{write_csv, write_text_line, ContinuousLog, DataLogger, LogFormat};
use refmon_core::faults::FaultLog;
use std::fs;
use std::path::{Path, PathBuf};

pub struct SessionLog {
    logger: DataLogger,
    continuous: Option<ContinuousLog>,
    dir: Option<PathBuf>,
    started: DateTime<Local>,
}

impl SessionLog {
    pub fn new(dir: Option<&Path>, continuous: bool) -> Result<Self> {
        let started = Local::now();
        let mut logger = DataLogger::for_grid();
        logger.start();

        let continuous = match dir {
            Some(dir) if continuous => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("cannot create log directory {}", dir.display()))?;
                let path = dir.join(file_name(started, LogFormat::Text.extension()));
                let log = ContinuousLog::open(&path)
                    .with_context(|| format!("cannot open {}", path.display()))?;
                tracing::info!("recording continuously to {}", path.display());
                Some(log)
            }
            _ => None,
        };

        Ok(Self {
            logger,
            continuous,
            dir: dir.map(Path::to_path_buf),
            started,
        })
    }

    /// Buffer one sample, appending it to the continuous log if open
    pub fn record(&mut self, values: Vec<Option<f64>>) -> Result<()> {
        let Some(entry) = self.logger.record(values) else {
            return Ok(());
        };
        if let Some(log) = self.continuous.as_mut() {
            log.append(entry).context("failed to append to data log")?;
        }
        Ok(())
    }

    /// Write the newest sample to its own text file ("save once")
    pub fn save_latest(&self) -> Result<Option<PathBuf>> {
        let (Some(dir), Some(entry)) = (self.dir.as_deref(), self.logger.latest()) else {
            return Ok(None);
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;
        let path = dir.join(file_name(entry.timestamp, "sample.txt"));
        let mut file =
            fs::File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
        write_text_line(&mut file, entry).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(Some(path))
    }

    pub fn samples(&self) -> usize {
        self.logger.entry_count()
    }

    /// Stop recording and write whatever the session still owes to disk
    pub fn finish(mut self, faults: &FaultLog) -> Result<Vec<PathBuf>> {
        self.logger.stop();
        let Some(dir) = self.dir.as_deref() else {
            return Ok(Vec::new());
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;

        let mut written = Vec::new();
        if self.continuous.is_none() && self.logger.entry_count() > 0 {
            let path = dir.join(file_name(self.started, LogFormat::Csv.extension()));
            let entries: Vec<_> = self.logger.entries().cloned().collect();
            write_csv(&path, self.logger.channels(), &entries)
                .with_context(|| format!("cannot write {}", path.display()))?;
            written.push(path);
        }

        let path = dir.join(file_name(self.started, "faults.json"));
        let json = faults.to_json().context("cannot serialize fault log")?;
        fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
        written.push(path);

        Ok(written)
    }
}

fn file_name(started: DateTime<Local>, suffix: &str) -> String {
    format!("refmon-{}.{}", started.format("%Y%m%d-%H%M%S"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Vec<Option<f64>> {
        let mut values = vec![None; 36];
        values[0] = Some(25.18);
        values
    }

    #[test]
    fn test_csv_written_at_finish() {
        let dir = tempdir().unwrap();
        let faults = FaultLog::with_session_start();
        let mut session = SessionLog::new(Some(dir.path()), false).unwrap();
        session.record(sample()).unwrap();
        session.record(sample()).unwrap();
        assert_eq!(session.samples(), 2);

        let written = session.finish(&faults).unwrap();
        assert_eq!(written.len(), 2);
        let csv = fs::read_to_string(&written[0]).unwrap();
        assert!(csv.starts_with("Index,Time,Grid-01,"));
        assert_eq!(csv.lines().count(), 3);
        assert!(written[1].to_string_lossy().ends_with("faults.json"));
    }

    #[test]
    fn test_continuous_log_appends() {
        let dir = tempdir().unwrap();
        let mut session = SessionLog::new(Some(dir.path()), true).unwrap();
        session.record(sample()).unwrap();

        let text_log = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .find(|p| p.extension().is_some_and(|e| e == "txt"))
            .unwrap();
        let content = fs::read_to_string(text_log).unwrap();
        assert!(content.starts_with("0 25.18 0 0"));

        let written = session.finish(&FaultLog::new()).unwrap();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn test_save_latest() {
        let dir = tempdir().unwrap();
        let mut session = SessionLog::new(Some(dir.path()), false).unwrap();
        assert_eq!(session.save_latest().unwrap(), None);

        session.record(sample()).unwrap();
        let path = session.save_latest().unwrap().unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("0 25.18 "));
    }

    #[test]
    fn test_no_directory_writes_nothing() {
        let mut session = SessionLog::new(None, true).unwrap();
        session.record(sample()).unwrap();
        assert!(session.finish(&FaultLog::new()).unwrap().is_empty());
    }
}
