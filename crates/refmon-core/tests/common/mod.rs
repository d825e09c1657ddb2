//! Shared fixtures for the integration tests

#![allow(dead_code)]

use refmon_core::protocol::CommunicationChannel;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// In-memory serial channel; clones share the same buffers
#[derive(Clone, Default)]
pub struct ScriptedChannel {
    incoming: Arc<Mutex<VecDeque<u8>>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue lines for the worker to read, each terminated with `\n`
    pub fn push_lines<S: AsRef<str>>(&self, lines: impl IntoIterator<Item = S>) {
        let mut incoming = self.incoming.lock().unwrap();
        for line in lines {
            incoming.extend(line.as_ref().as_bytes());
            incoming.push_back(b'\n');
        }
    }

    /// Everything the worker wrote so far
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written.lock().unwrap()).into_owned()
    }

    pub fn boxed(&self) -> Box<dyn CommunicationChannel> {
        Box::new(self.clone())
    }
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut incoming = self.incoming.lock().unwrap();
        if incoming.is_empty() {
            drop(incoming);
            thread::sleep(Duration::from_millis(1));
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        let n = buf.len().min(incoming.len());
        for (dst, src) in buf.iter_mut().zip(incoming.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CommunicationChannel for ScriptedChannel {
    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.incoming.lock().unwrap().clear();
        Ok(())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

/// Poll `condition` until it holds or ten seconds pass
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// A complete ADC frame with every slot set to `code`
pub fn adc_frame_lines(code: &str) -> Vec<String> {
    let mut lines = vec!["begd".to_string()];
    lines.extend(std::iter::repeat(code.to_string()).take(40));
    lines.push("endd".to_string());
    lines
}
