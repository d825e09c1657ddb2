//! Log file formats
//!
//! The rig's text format is one line per sample: the sample index followed by
//! the 36 channel values, space separated. Channels without a reading are
//! written as `0`, which is what the existing analysis scripts expect.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::LogEntry;

/// Supported log file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Space-separated text
    Text,
    /// Comma-separated values with a header row
    Csv,
}

impl LogFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "txt" | "log" => Some(LogFormat::Text),
            "csv" => Some(LogFormat::Csv),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            LogFormat::Text => "txt",
            LogFormat::Csv => "csv",
        }
    }
}

/// Render a channel value; no reading renders as `0`
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => "0".to_string(),
        Some(v) if v.fract() == 0.0 => format!("{v:.1}"),
        Some(v) => format!("{v}"),
    }
}

/// Write one entry in the text format
pub fn write_text_line<W: Write>(writer: &mut W, entry: &LogEntry) -> io::Result<()> {
    write!(writer, "{}", entry.index)?;
    for value in &entry.values {
        write!(writer, " {}", format_value(*value))?;
    }
    writeln!(writer)
}

/// Write log entries to a CSV file
pub fn write_csv<P: AsRef<Path>>(
    path: P,
    channels: &[String],
    entries: &[LogEntry],
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write!(writer, "Index,Time")?;
    for channel in channels {
        write!(writer, ",{}", channel)?;
    }
    writeln!(writer)?;

    for entry in entries {
        write!(writer, "{},{}", entry.index, entry.timestamp.to_rfc3339())?;
        for value in &entry.values {
            match value {
                Some(v) => write!(writer, ",{:.2}", v)?,
                None => write!(writer, ",")?,
            }
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Text log appended to as samples arrive ("save continuously")
pub struct ContinuousLog {
    writer: BufWriter<File>,
}

impl ContinuousLog {
    /// Open `path` for appending, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Append one entry and flush it to disk
    pub fn append(&mut self, entry: &LogEntry) -> io::Result<()> {
        write_text_line(&mut self.writer, entry)?;
        self.writer.flush()
    }
}
