use serialport::SerialPort;
use std::io::{self, Read, Write};

/// Abstraction over the byte stream a link worker polls
pub trait CommunicationChannel: Read + Write + Send {
    /// Drop whatever is waiting in the input buffer
    fn clear_input_buffer(&mut self) -> io::Result<()>;

    /// Human-readable name of the underlying port
    fn name(&self) -> String;
}

/// Serial port wrapper implementing CommunicationChannel
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an already opened and configured port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl CommunicationChannel for SerialChannel {
    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::other)
    }

    fn name(&self) -> String {
        self.port.name().unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// Whether a read error only means "nothing arrived within the timeout"
pub(crate) fn is_idle_read(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
