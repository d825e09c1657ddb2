//! Demo Mode - simulated rig boards for running without hardware
//!
//! A [`SimulatedRig`] is a [`CommunicationChannel`] that behaves like one of
//! the rig's microcontrollers: the ADC board answers pings and data requests,
//! the infrared board streams a frame every few polls, and the heater
//! controller accepts commands. Channel temperatures wander slowly around
//! room temperature.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use crate::decode::{ADC_SLOTS, INFRARED_SLOTS};
use crate::protocol::commands::{
    DATA_REQUEST, PING1, PING1_ACK, PING2, PING2_FULL_ACK, PING2_PARTIAL_ACK,
};
use crate::protocol::CommunicationChannel;
use crate::thermistor::{
    ADC_FULL_SCALE, BETA, KELVIN_OFFSET, NOMINAL_RESISTANCE_OHMS, NOMINAL_TEMPERATURE_K,
    SERIES_RESISTOR_OHMS,
};

/// Empty polls between infrared frames
const INFRARED_SWEEP_POLLS: u32 = 50;

/// How long an empty read blocks, matching the default poll timeout
const IDLE_READ: Duration = Duration::from_millis(1);

/// Which board to imitate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigBoard {
    /// Thermistor board on the ADC link
    Adc,
    /// Infrared camera board
    Infrared,
    /// Heater controller
    Heater,
}

/// Simulated microcontroller behind a serial link
pub struct SimulatedRig {
    board: RigBoard,
    /// Bytes waiting to be read by the host
    outgoing: VecDeque<u8>,
    /// Partial line written by the host
    incoming: Vec<u8>,
    /// Current temperature of each raw sensor
    temperatures: Vec<f64>,
    /// Heater lines received so far
    heater_lines: Vec<String>,
    polls_until_sweep: u32,
    rng: StdRng,
}

impl SimulatedRig {
    /// Simulated board seeded from entropy
    pub fn new(board: RigBoard) -> Self {
        Self::with_rng(board, StdRng::from_entropy())
    }

    /// Deterministic simulated board
    pub fn with_seed(board: RigBoard, seed: u64) -> Self {
        Self::with_rng(board, StdRng::seed_from_u64(seed))
    }

    fn with_rng(board: RigBoard, mut rng: StdRng) -> Self {
        let sensors = match board {
            RigBoard::Adc => ADC_SLOTS,
            RigBoard::Infrared => INFRARED_SLOTS,
            RigBoard::Heater => 0,
        };
        let temperatures = (0..sensors).map(|_| rng.gen_range(20.0..30.0)).collect();
        Self {
            board,
            outgoing: VecDeque::new(),
            incoming: Vec::new(),
            temperatures,
            heater_lines: Vec::new(),
            polls_until_sweep: INFRARED_SWEEP_POLLS,
            rng,
        }
    }

    /// Heater commands received, terminators stripped
    pub fn heater_lines(&self) -> &[String] {
        &self.heater_lines
    }

    fn queue(&mut self, line: &str) {
        self.outgoing.extend(line.as_bytes());
        self.outgoing.push_back(b'\n');
    }

    fn drift(&mut self) {
        for t in &mut self.temperatures {
            *t = (*t + self.rng.gen_range(-0.2..0.2)).clamp(15.0, 40.0);
        }
    }

    fn handle_line(&mut self, line: &str) {
        match (self.board, line) {
            (RigBoard::Adc, PING1) => self.queue(PING1_ACK),
            (RigBoard::Adc, PING2) => {
                self.queue(PING2_PARTIAL_ACK);
                self.queue(PING2_FULL_ACK);
            }
            (RigBoard::Adc, DATA_REQUEST) => self.queue_adc_frame(),
            (RigBoard::Heater, _) => {
                tracing::debug!("simulated heater: {}", line);
                self.heater_lines.push(line.to_string());
            }
            _ => tracing::debug!("simulated {:?} board ignored '{}'", self.board, line),
        }
    }

    fn queue_adc_frame(&mut self) {
        self.drift();
        self.queue("begd");
        let codes: Vec<String> = self
            .temperatures
            .iter()
            .map(|t| format!("{:04}", adc_code_for(*t)))
            .collect();
        for code in codes {
            self.queue(&code);
        }
        self.queue("endd");
    }

    fn queue_infrared_frame(&mut self) {
        self.drift();
        self.queue("begin");
        let slots: Vec<String> = self
            .temperatures
            .iter()
            .map(|t| {
                let status = if *t < 18.0 {
                    1
                } else if *t > 38.0 {
                    2
                } else {
                    0
                };
                let sign = if *t < 0.0 { 1 } else { 0 };
                let tenths = (t.abs() * 10.0).round() as u32;
                format!("{status}{sign}{tenths:04}")
            })
            .collect();
        for slot in slots {
            self.queue(&slot);
        }
        self.queue("end");
    }
}

/// ADC code the thermistor divider produces at `celsius`
pub fn adc_code_for(celsius: f64) -> u16 {
    let kelvin = celsius + KELVIN_OFFSET;
    let resistance =
        NOMINAL_RESISTANCE_OHMS * (BETA * (1.0 / kelvin - 1.0 / NOMINAL_TEMPERATURE_K)).exp();
    let code = f64::from(ADC_FULL_SCALE) * resistance / (resistance + SERIES_RESISTOR_OHMS);
    code.round().clamp(1.0, f64::from(ADC_FULL_SCALE - 1)) as u16
}

impl Read for SimulatedRig {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.outgoing.is_empty() {
            if self.board == RigBoard::Infrared {
                self.polls_until_sweep = self.polls_until_sweep.saturating_sub(1);
                if self.polls_until_sweep == 0 {
                    self.polls_until_sweep = INFRARED_SWEEP_POLLS;
                    self.queue_infrared_frame();
                }
            }
            if self.outgoing.is_empty() {
                thread::sleep(IDLE_READ);
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
            }
        }

        let n = buf.len().min(self.outgoing.len());
        for (dst, src) in buf.iter_mut().zip(self.outgoing.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for SimulatedRig {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.incoming).trim().to_string();
                self.incoming.clear();
                self.handle_line(&line);
            } else {
                self.incoming.push(b);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CommunicationChannel for SimulatedRig {
    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.outgoing.clear();
        Ok(())
    }

    fn name(&self) -> String {
        format!("simulated-{:?}", self.board).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{AdcLayout, InfraredLayout};
    use crate::protocol::{FrameDecoder, FrameLayout, Step};
    use crate::readings::TemperatureFrame;
    use crate::thermistor::ConversionScheme;

    fn read_lines(rig: &mut SimulatedRig) -> Vec<String> {
        let mut bytes = Vec::new();
        let mut buf = [0u8; 64];
        while let Ok(n) = rig.read(&mut buf) {
            bytes.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn decode_all<L: FrameLayout>(layout: L, lines: &[String]) -> L::Frame {
        let mut decoder = FrameDecoder::new(layout);
        let mut last = None;
        for line in lines {
            if let Ok(Some(Step::Frame(decoded))) = decoder.feed(line) {
                assert!(decoded.errors.is_empty(), "{:?}", decoded.errors);
                last = Some(decoded.frame);
            }
        }
        last.expect("no frame produced")
    }

    #[test]
    fn test_adc_code_round_trip() {
        let code = adc_code_for(25.0);
        let t = ConversionScheme::Beta.temperature(code).unwrap().unwrap();
        assert!((t - 25.0).abs() < 0.1, "{} -> {}", code, t);
    }

    #[test]
    fn test_adc_board_answers_pings() {
        let mut rig = SimulatedRig::with_seed(RigBoard::Adc, 7);
        rig.write_all(b"b1\nb2\n").unwrap();
        assert_eq!(read_lines(&mut rig), vec!["b1c", "b2c", "b2n"]);
    }

    #[test]
    fn test_adc_board_serves_frames() {
        let mut rig = SimulatedRig::with_seed(RigBoard::Adc, 7);
        rig.write_all(b"dreq\n").unwrap();
        let lines = read_lines(&mut rig);
        assert_eq!(lines.len(), ADC_SLOTS + 2);

        let frame = decode_all(AdcLayout::default(), &lines);
        for reading in frame.readings() {
            assert!((14.0..41.0).contains(&reading.celsius), "{:?}", reading);
        }
        assert_eq!(frame.readings().len(), 32);
    }

    #[test]
    fn test_infrared_board_streams() {
        let mut rig = SimulatedRig::with_seed(RigBoard::Infrared, 3);
        let mut lines = Vec::new();
        for _ in 0..INFRARED_SWEEP_POLLS {
            lines.extend(read_lines(&mut rig));
        }
        let frame = decode_all(InfraredLayout, &lines);
        assert_eq!(frame.readings().len(), INFRARED_SLOTS);
    }

    #[test]
    fn test_heater_records_lines() {
        let mut rig = SimulatedRig::with_seed(RigBoard::Heater, 1);
        rig.write_all(b"03 45\n").unwrap();
        assert_eq!(rig.heater_lines(), &["03 45".to_string()]);
    }
}
