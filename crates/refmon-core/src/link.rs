//! Link workers
//!
//! Each sensor link is polled by its own OS thread. One poll iteration is a
//! single bounded read, decoding of every complete token that arrived, and a
//! tick of the outbound schedule. Decoded frames are published as versioned
//! [`LinkSnapshot`]s through a watch channel; consumers clone the latest one.
//!
//! Nothing escapes the worker: every error is appended to the shared
//! [`FaultLog`] and the loop carries on until the handle asks it to stop.

use bytes::BytesMut;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Display;
use std::io::{Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, info};

use crate::config::LinkConfig;
use crate::faults::FaultLog;
use crate::protocol::stream::is_idle_read;
use crate::protocol::{
    configure_port, open_port, Command, CommunicationChannel, DecodeError,
    FrameDecoder, FrameLayout, HandshakeFlags, PollSchedule, ProtocolError, SerialChannel, Step,
    TokenCodec,
};

/// Bytes requested per read
const READ_CHUNK: usize = 256;

/// Pause after a failed read before polling again
const IO_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Worker lifecycle as seen by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkStatus {
    /// Worker not yet polling
    Starting,
    /// Worker polling an open channel
    Open,
    /// Worker stopped and channel closed
    Closed,
}

/// Latest state of one link
#[derive(Debug, Clone, Serialize)]
pub struct LinkSnapshot<F> {
    /// Worker lifecycle
    pub status: LinkStatus,
    /// Frames decoded so far
    pub sequence: u64,
    /// When the current frame was decoded
    pub updated_at: Option<DateTime<Local>>,
    /// Most recent frame
    pub frame: F,
    /// Handshake flags
    pub flags: HandshakeFlags,
}

impl<F: Default> Default for LinkSnapshot<F> {
    fn default() -> Self {
        Self {
            status: LinkStatus::Starting,
            sequence: 0,
            updated_at: None,
            frame: F::default(),
            flags: HandshakeFlags::default(),
        }
    }
}

/// Open and configure the serial port described by `config`
pub fn open_link(config: &LinkConfig) -> Result<Box<dyn CommunicationChannel>, ProtocolError> {
    let mut port = open_port(
        &config.port_name,
        Some(config.baud_rate),
        Some(config.poll_timeout_ms),
    )?;
    configure_port(port.as_mut())?;
    info!(
        "opened {} at {} baud, {}ms poll timeout",
        config.port_name, config.baud_rate, config.poll_timeout_ms
    );
    Ok(Box::new(SerialChannel::new(port)))
}

/// Start a worker decoding `layout` frames from `channel`.
///
/// `schedule` drives the outbound pings and data requests; links that only
/// listen pass `None`.
pub fn spawn_link<L: FrameLayout>(
    layout: L,
    channel: Box<dyn CommunicationChannel>,
    schedule: Option<PollSchedule>,
    faults: FaultLog,
) -> Result<LinkHandle<L::Frame>, ProtocolError> {
    let (snapshots, receiver) = watch::channel(LinkSnapshot::default());
    let stop = Arc::new(AtomicBool::new(false));

    let worker = LinkWorker {
        channel,
        decoder: FrameDecoder::new(layout),
        codec: TokenCodec::new(),
        buffer: BytesMut::with_capacity(READ_CHUNK),
        schedule,
        snapshots,
        faults,
        stop: stop.clone(),
    };

    let thread = thread::Builder::new()
        .name(format!("refmon-{}", L::NAME))
        .spawn(move || worker.run())
        .map_err(|e| ProtocolError::WorkerFailed(e.to_string()))?;

    Ok(LinkHandle {
        name: L::NAME,
        stop,
        thread: Some(thread),
        snapshots: receiver,
    })
}

/// Owner of a running link worker
pub struct LinkHandle<F> {
    name: &'static str,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    snapshots: watch::Receiver<LinkSnapshot<F>>,
}

impl<F: Clone> LinkHandle<F> {
    /// Link name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Copy of the latest snapshot
    pub fn snapshot(&self) -> LinkSnapshot<F> {
        self.snapshots.borrow().clone()
    }

    /// Receiver for consumers that want change notification
    pub fn subscribe(&self) -> watch::Receiver<LinkSnapshot<F>> {
        self.snapshots.clone()
    }

    /// Whether the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the worker and wait for it to close its channel
    pub fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.stop.store(true, Ordering::Relaxed);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| ProtocolError::WorkerFailed(format!("{} worker panicked", self.name))),
            None => Ok(()),
        }
    }
}

impl<F> Drop for LinkHandle<F> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct LinkWorker<L: FrameLayout> {
    channel: Box<dyn CommunicationChannel>,
    decoder: FrameDecoder<L>,
    codec: TokenCodec,
    buffer: BytesMut,
    schedule: Option<PollSchedule>,
    snapshots: watch::Sender<LinkSnapshot<L::Frame>>,
    faults: FaultLog,
    stop: Arc<AtomicBool>,
}

impl<L: FrameLayout> LinkWorker<L> {
    fn run(mut self) {
        let port = self.channel.name();
        info!("{}: worker started on {}", L::NAME, port);
        // Bytes queued before the worker started belong to no frame we asked for
        if let Err(e) = self.channel.clear_input_buffer() {
            self.fault("read", e);
        }
        self.snapshots.send_modify(|s| s.status = LinkStatus::Open);

        let stop = self.stop.clone();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            while !stop.load(Ordering::Relaxed) {
                if let Err(e) = self.poll_once() {
                    self.fault("read", e);
                    thread::sleep(IO_RETRY_BACKOFF);
                }
            }
        }));

        if let Err(panic_info) = outcome {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            self.fault("worker", format!("worker panicked: {panic_msg}"));
        }

        self.snapshots.send_modify(|s| s.status = LinkStatus::Closed);
        info!("{}: worker stopped, closing {}", L::NAME, port);
    }

    /// One bounded read, token decoding, one schedule tick
    fn poll_once(&mut self) -> Result<(), ProtocolError> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.channel.read(&mut chunk) {
            Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
            Err(e) if is_idle_read(&e) => {}
            Err(e) => return Err(e.into()),
        }

        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(token)) => self.handle_token(&token),
                Ok(None) => break,
                Err(e) => self.fault("framing", e),
            }
        }

        let collecting = self.decoder.is_collecting();
        if let Some(cmd) = self.schedule.as_mut().and_then(|s| s.tick(collecting)) {
            self.send(cmd)?;
        }
        Ok(())
    }

    fn handle_token(&mut self, token: &str) {
        debug!("{}: <- {:?}", L::NAME, token);
        match self.decoder.feed(token) {
            Ok(None) => {}
            Ok(Some(Step::Handshake(handshake))) => {
                debug!("{}: handshake {:?}", L::NAME, handshake);
                self.publish_flags();
            }
            Ok(Some(Step::Frame(decoded))) => {
                for error in &decoded.errors {
                    self.fault("decode", error);
                }
                let flags = self.decoder.flags();
                let frame = decoded.frame;
                self.snapshots.send_modify(|s| {
                    s.sequence += 1;
                    s.updated_at = Some(Local::now());
                    s.frame = frame;
                    s.flags = flags;
                });
            }
            Err(e) => self.fault("frame", e),
        }
    }

    fn send(&mut self, cmd: Command) -> Result<(), ProtocolError> {
        match cmd {
            Command::Ping1 => self.decoder.flags_mut().clear_ping1(),
            Command::Ping2 => self.decoder.flags_mut().clear_ping2(),
            Command::DataRequest => {
                if let Some(received) = self.decoder.abandon() {
                    self.fault("frame", DecodeError::AbandonedFrame { received });
                }
            }
            Command::Heater(_) => {}
        }
        self.publish_flags();

        debug!("{}: -> {:?}", L::NAME, cmd);
        let mut out = BytesMut::new();
        self.codec.encode(cmd, &mut out)?;
        self.channel.write_all(&out)?;
        Ok(())
    }

    fn publish_flags(&self) {
        let flags = self.decoder.flags();
        self.snapshots.send_if_modified(|s| {
            let changed = s.flags != flags;
            s.flags = flags;
            changed
        });
    }

    fn fault(&self, what: &str, error: impl Display) {
        self.faults.record(format!("{}::{}", L::NAME, what), error);
    }
}
