//! Decoded readings
//!
//! Both boards report onto the same 36-channel logical grid. A channel that
//! produced no usable value is `None`; a genuine 0 °C reading is `Some(0.0)`.

use serde::{Deserialize, Serialize};

use crate::decode::ADC_MAPPED_CHANNELS;

/// Logical channels on the rig's grid
pub const LOGICAL_CHANNELS: usize = 36;

/// One channel's temperature, channels numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// 1-based logical channel
    pub channel: usize,
    /// Temperature in °C
    pub celsius: f64,
}

/// Anything that can present itself as a row of channel temperatures
pub trait TemperatureFrame {
    /// Temperature per logical channel, in channel order
    fn temperatures(&self) -> Vec<Option<f64>>;

    /// Leading channels the board can populate at all
    fn wired_channels(&self) -> usize {
        LOGICAL_CHANNELS
    }

    /// Present readings only, 1-based channel numbers
    fn readings(&self) -> Vec<Reading> {
        self.temperatures()
            .into_iter()
            .enumerate()
            .filter_map(|(i, t)| {
                t.map(|celsius| Reading {
                    channel: i + 1,
                    celsius,
                })
            })
            .collect()
    }
}

/// Thermistor board output after swap and remap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdcFrame {
    /// Temperature per logical channel
    pub channels: Vec<Option<f64>>,
}

impl Default for AdcFrame {
    fn default() -> Self {
        Self {
            channels: vec![None; LOGICAL_CHANNELS],
        }
    }
}

impl TemperatureFrame for AdcFrame {
    fn temperatures(&self) -> Vec<Option<f64>> {
        self.channels.clone()
    }

    fn wired_channels(&self) -> usize {
        ADC_MAPPED_CHANNELS
    }
}

/// Range status reported by the infrared board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalStatus {
    /// `0`
    Normal,
    /// `1`
    TooCold,
    /// `2`
    TooHot,
}

impl ThermalStatus {
    /// Decode the status digit
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(ThermalStatus::Normal),
            '1' => Some(ThermalStatus::TooCold),
            '2' => Some(ThermalStatus::TooHot),
            _ => None,
        }
    }
}

/// One infrared channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InfraredReading {
    /// Range status flag
    pub status: ThermalStatus,
    /// Signed temperature in °C
    pub celsius: f64,
}

/// Infrared board output, slot order is channel order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfraredFrame {
    /// Reading per logical channel
    pub channels: Vec<Option<InfraredReading>>,
}

impl Default for InfraredFrame {
    fn default() -> Self {
        Self {
            channels: vec![None; LOGICAL_CHANNELS],
        }
    }
}

impl TemperatureFrame for InfraredFrame {
    fn temperatures(&self) -> Vec<Option<f64>> {
        self.channels.iter().map(|c| c.map(|r| r.celsius)).collect()
    }
}
