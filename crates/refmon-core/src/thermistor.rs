//! Thermistor conversions
//!
//! The ADC board measures each NTC thermistor through an 18 kΩ divider on a
//! 3.3 V, 12-bit converter. A code is turned into a resistance, and the
//! resistance into a temperature by one of two schemes:
//!
//! - [`ConversionScheme::Beta`]: simplified Beta equation, B = 3435,
//!   R25 = 10 kΩ
//! - [`ConversionScheme::Table`]: nearest entry of a 5 °C resistance table
//!   with linear interpolation to the neighbouring entry
//!
//! Both report the absolute value rounded to two decimals. Codes of zero and
//! resistances at or above [`RESISTANCE_CUTOFF_OHMS`] yield no reading.

use serde::{Deserialize, Serialize};

use crate::protocol::SlotError;

/// Largest code of the 12-bit converter
pub const ADC_FULL_SCALE: u16 = 4095;
/// Divider supply voltage
pub const SUPPLY_VOLTAGE: f64 = 3.3;
/// Fixed divider resistor
pub const SERIES_RESISTOR_OHMS: f64 = 18_000.0;
/// Resistances at or above this are treated as an open sensor
pub const RESISTANCE_CUTOFF_OHMS: f64 = 190_953.0;

/// Thermistor Beta constant
pub const BETA: f64 = 3435.0;
/// Thermistor resistance at the nominal temperature
pub const NOMINAL_RESISTANCE_OHMS: f64 = 10_000.0;
/// Nominal temperature in kelvin
pub const NOMINAL_TEMPERATURE_K: f64 = 298.0;
/// Kelvin to Celsius offset used by the rig
pub const KELVIN_OFFSET: f64 = 273.0;

/// Resistance at -40 °C, -35 °C, ... 105 °C
pub const RESISTANCE_TABLE: [f64; 30] = [
    190953.0, 145953.0, 112440.0, 87285.0, 68260.0, 53762.0, 42636.0, 34038.0, 27348.0, 22108.0,
    17979.0, 14706.0, 12094.0, 10000.0, 8310.8, 6941.1, 5824.9, 4910.6, 4158.3, 3536.2, 3019.7,
    2588.8, 2228.0, 1924.6, 1668.4, 1451.3, 1266.7, 1109.2, 974.26, 858.33,
];
/// Temperature of the first table entry
pub const TABLE_START_CELSIUS: f64 = -40.0;
/// Temperature step between table entries
pub const TABLE_STEP_CELSIUS: f64 = 5.0;

/// How resistance is turned into temperature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionScheme {
    /// Beta equation
    #[default]
    Beta,
    /// Resistance table interpolation
    Table,
}

impl ConversionScheme {
    /// Temperature for an ADC code, `None` when the slot carries no reading
    pub fn temperature(&self, code: u16) -> Result<Option<f64>, SlotError> {
        if code == 0 {
            return Ok(None);
        }
        if code > ADC_FULL_SCALE {
            return Err(SlotError::CodeOutOfRange(code));
        }

        // Whole ohms, as the board's calibration was taken
        let resistance = adc_to_resistance(code).round();
        if !resistance.is_finite() || resistance >= RESISTANCE_CUTOFF_OHMS {
            return Ok(None);
        }

        match self {
            ConversionScheme::Beta => Ok(Some(beta_temperature(resistance))),
            ConversionScheme::Table => table_temperature(resistance).map(Some),
        }
    }
}

/// Thermistor resistance for an ADC code.
///
/// Grows with the code; full scale is an open circuit and yields infinity.
pub fn adc_to_resistance(code: u16) -> f64 {
    let volts = SUPPLY_VOLTAGE * f64::from(code) / f64::from(ADC_FULL_SCALE);
    SERIES_RESISTOR_OHMS / (SUPPLY_VOLTAGE / volts - 1.0)
}

/// Beta-equation temperature in °C, absolute and rounded to two decimals
pub fn beta_temperature(resistance: f64) -> f64 {
    let inv_t = 1.0 / NOMINAL_TEMPERATURE_K + (resistance / NOMINAL_RESISTANCE_OHMS).ln() / BETA;
    round2((1.0 / inv_t - KELVIN_OFFSET).abs())
}

/// Table-interpolated temperature in °C, absolute and rounded to two decimals
pub fn table_temperature(resistance: f64) -> Result<f64, SlotError> {
    let mut idx = RESISTANCE_TABLE
        .iter()
        .map(|r| (resistance - r).abs())
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best })
        .0;

    // Interpolate against the entry on the colder side
    if resistance < RESISTANCE_TABLE[idx] {
        idx += 1;
    }
    if idx == 0 || idx >= RESISTANCE_TABLE.len() {
        return Err(SlotError::OutsideTable(resistance));
    }

    let upper = RESISTANCE_TABLE[idx - 1];
    let lower = RESISTANCE_TABLE[idx];
    let base = TABLE_START_CELSIUS + TABLE_STEP_CELSIUS * idx as f64;
    let t = base - TABLE_STEP_CELSIUS * (resistance - lower) / (upper - lower);
    Ok(round2(t.abs()))
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_point() {
        assert_eq!(beta_temperature(10_000.0), 25.0);
        assert_eq!(table_temperature(10_000.0).unwrap(), 25.0);
    }

    #[test]
    fn test_zero_code_is_no_reading() {
        assert_eq!(ConversionScheme::Beta.temperature(0).unwrap(), None);
        assert_eq!(ConversionScheme::Table.temperature(0).unwrap(), None);
    }

    #[test]
    fn test_open_sensor_is_no_reading() {
        assert_eq!(ConversionScheme::Beta.temperature(ADC_FULL_SCALE).unwrap(), None);
        // 757 kΩ is far past the cutoff
        assert_eq!(ConversionScheme::Beta.temperature(4000).unwrap(), None);
    }

    #[test]
    fn test_resistance_rounded_before_conversion() {
        // 5823.53 Ω would give 39.67 °C; the whole-ohm 5824 Ω gives 39.66 °C
        assert_eq!(beta_temperature(adc_to_resistance(1001)), 39.67);
        assert_eq!(ConversionScheme::Beta.temperature(1001).unwrap(), Some(39.66));
    }

    #[test]
    fn test_code_above_full_scale() {
        assert_eq!(
            ConversionScheme::Beta.temperature(5000),
            Err(SlotError::CodeOutOfRange(5000))
        );
    }

    #[test]
    fn test_table_below_last_entry() {
        assert!(matches!(
            table_temperature(500.0),
            Err(SlotError::OutsideTable(_))
        ));
    }

    #[test]
    fn test_table_exact_entry_can_be_zero_degrees() {
        // 27348 Ω is the 0 °C entry: a real reading, distinct from "none"
        assert_eq!(table_temperature(27_348.0).unwrap(), 0.0);
    }
}
