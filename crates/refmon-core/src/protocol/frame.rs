//! Frame state machine
//!
//! A frame is the run of slot tokens between a begin and an end marker.
//! `FrameDecoder` is shared by both sensor links; what differs per link
//! (markers, slot capacity, slot decoding) lives behind [`FrameLayout`].
//!
//! Marker handling:
//! - begin while idle opens a frame; begin inside an open frame restarts it
//!   and is never stored as data
//! - end while collecting closes the frame and decodes it; end while idle is
//!   a desync and leaves the state untouched
//! - a slot beyond the layout's capacity drops the whole frame
//! - handshake replies set their flag in any state and are never stored

use serde::Serialize;
use tracing::debug;

use super::{DecodeError, Handshake};

/// Per-link framing rules and slot decoding
pub trait FrameLayout: Send + 'static {
    /// Decoded output of one complete frame
    type Frame: Clone + Default + Send + Sync + 'static;

    /// Short name used in fault sites and thread names
    const NAME: &'static str;
    /// Token opening a frame
    const BEGIN: &'static str;
    /// Token closing a frame
    const END: &'static str;
    /// Slots in a complete frame
    const CAPACITY: usize;

    /// Decode the collected slot tokens.
    ///
    /// Bad slots must not stop the remaining slots from decoding; each one is
    /// reported in [`DecodedFrame::errors`].
    fn decode(&self, slots: &[String]) -> DecodedFrame<Self::Frame>;
}

/// Result of decoding one frame
#[derive(Debug, Clone)]
pub struct DecodedFrame<F> {
    /// The decoded values; failed slots are left empty
    pub frame: F,
    /// One entry per slot (or frame-level) problem
    pub errors: Vec<DecodeError>,
}

/// Acknowledgement state of the diagnostic pings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HandshakeFlags {
    /// `b1c` seen since the last ping 1
    pub ping1_ack: bool,
    /// `b2c` or `b2n` seen since the last ping 2
    pub ping2_ack: bool,
    /// `b2n` seen since the last ping 2
    pub ping2_secondary_ack: bool,
}

impl HandshakeFlags {
    /// Record a handshake reply
    pub fn apply(&mut self, handshake: Handshake) {
        match handshake {
            Handshake::Ping1Ack => self.ping1_ack = true,
            Handshake::Ping2PartialAck => self.ping2_ack = true,
            Handshake::Ping2FullAck => {
                self.ping2_ack = true;
                self.ping2_secondary_ack = true;
            }
        }
    }

    /// A new ping 1 went out
    pub fn clear_ping1(&mut self) {
        self.ping1_ack = false;
    }

    /// A new ping 2 went out
    pub fn clear_ping2(&mut self) {
        self.ping2_ack = false;
        self.ping2_secondary_ack = false;
    }
}

/// Collection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for a begin marker
    Idle,
    /// Storing slot tokens until the end marker
    Collecting,
}

/// Something the decoder produced from one token
#[derive(Debug, Clone)]
pub enum Step<F> {
    /// A frame closed and was decoded
    Frame(DecodedFrame<F>),
    /// A handshake flag was set
    Handshake(Handshake),
}

/// Stateful decoder for one link
pub struct FrameDecoder<L: FrameLayout> {
    layout: L,
    state: FrameState,
    slots: Vec<String>,
    flags: HandshakeFlags,
}

impl<L: FrameLayout> FrameDecoder<L> {
    /// Create an idle decoder
    pub fn new(layout: L) -> Self {
        Self {
            layout,
            state: FrameState::Idle,
            slots: Vec::with_capacity(L::CAPACITY),
            flags: HandshakeFlags::default(),
        }
    }

    /// Current collection state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Whether a frame is open
    pub fn is_collecting(&self) -> bool {
        self.state == FrameState::Collecting
    }

    /// Slots stored in the open frame
    pub fn collected(&self) -> usize {
        self.slots.len()
    }

    /// Current handshake flags
    pub fn flags(&self) -> HandshakeFlags {
        self.flags
    }

    /// Mutable access for clearing flags when a ping goes out
    pub fn flags_mut(&mut self) -> &mut HandshakeFlags {
        &mut self.flags
    }

    /// The layout this decoder applies
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Feed one token (terminator already removed).
    ///
    /// Errors describe protocol desyncs; the decoder has already recovered
    /// from them when they are returned.
    pub fn feed(&mut self, token: &str) -> Result<Option<Step<L::Frame>>, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        if let Some(handshake) = Handshake::from_token(token) {
            self.flags.apply(handshake);
            return Ok(Some(Step::Handshake(handshake)));
        }

        if token == L::BEGIN {
            let discarded = self.slots.len();
            let was_collecting = self.is_collecting();
            self.slots.clear();
            self.state = FrameState::Collecting;
            if was_collecting {
                return Err(DecodeError::RestartedFrame { discarded });
            }
            return Ok(None);
        }

        if token == L::END {
            if !self.is_collecting() {
                return Err(DecodeError::UnmatchedTerminator(token.to_string()));
            }
            self.state = FrameState::Idle;
            let slots = std::mem::take(&mut self.slots);
            let decoded = self.layout.decode(&slots);
            self.slots = slots;
            self.slots.clear();
            return Ok(Some(Step::Frame(decoded)));
        }

        match self.state {
            FrameState::Collecting if self.slots.len() >= L::CAPACITY => {
                self.slots.clear();
                self.state = FrameState::Idle;
                Err(DecodeError::SlotOverflow {
                    capacity: L::CAPACITY,
                })
            }
            FrameState::Collecting => {
                self.slots.push(token.to_string());
                Ok(None)
            }
            FrameState::Idle => {
                debug!("{}: ignoring '{}' outside a frame", L::NAME, token);
                Ok(None)
            }
        }
    }

    /// Drop an open frame, returning how many slots it held
    pub fn abandon(&mut self) -> Option<usize> {
        if !self.is_collecting() {
            return None;
        }
        let received = self.slots.len();
        self.slots.clear();
        self.state = FrameState::Idle;
        Some(received)
    }
}
