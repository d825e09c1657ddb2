//! Monitor configuration
//!
//! Persisted as pretty-printed JSON. Protocol constants (tokens, slot counts,
//! poll thresholds, the remap table) are not configurable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::{DEFAULT_BAUD_RATE, DEFAULT_POLL_TIMEOUT_MS};
use crate::thermistor::ConversionScheme;

/// Default consumer refresh cadence
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT_MS
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

/// One serial link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Bound on a single blocking read, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
}

impl LinkConfig {
    /// Link on `port_name` with default settings
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
        }
    }
}

/// Whole-monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Thermistor (ADC) board link
    #[serde(default)]
    pub adc_link: Option<LinkConfig>,
    /// Infrared board link
    #[serde(default)]
    pub infrared_link: Option<LinkConfig>,
    /// Heater controller link
    #[serde(default)]
    pub heater_link: Option<LinkConfig>,
    /// Thermistor conversion scheme
    #[serde(default)]
    pub conversion: ConversionScheme,
    /// Directory for data logs
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Append every refresh to the data log
    #[serde(default)]
    pub record_continuously: bool,
    /// Consumer refresh cadence in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            adc_link: None,
            infrared_link: None,
            heater_link: None,
            conversion: ConversionScheme::default(),
            log_dir: None,
            record_continuously: false,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }
}

impl MonitorConfig {
    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{ "adc_link": { "port_name": "COM3" } }"#).unwrap();
        let adc = config.adc_link.unwrap();
        assert_eq!(adc.baud_rate, 9600);
        assert_eq!(adc.poll_timeout_ms, DEFAULT_POLL_TIMEOUT_MS);
        assert_eq!(config.conversion, ConversionScheme::Beta);
        assert_eq!(config.refresh_interval_ms, 1000);
        assert!(config.infrared_link.is_none());
    }

    #[test]
    fn test_conversion_names() {
        let config: MonitorConfig = serde_json::from_str(r#"{ "conversion": "table" }"#).unwrap();
        assert_eq!(config.conversion, ConversionScheme::Table);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        let config = MonitorConfig {
            adc_link: Some(LinkConfig::new("/dev/ttyACM0")),
            heater_link: Some(LinkConfig::new("/dev/ttyACM2")),
            record_continuously: true,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(MonitorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MonitorConfig::load("/nonexistent/monitor.json"),
            Err(ConfigError::NotFound(_))
        ));
    }
}
