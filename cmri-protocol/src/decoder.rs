//! Node-side receive state machine
//!
//! The decoder consumes one byte per call and never fails. Each state has a
//! defined transition for every byte value, so malformed input, frames for
//! other nodes and unknown commands all end up back at [`DecoderState::Preamble1`].
//!
//! The transition table lives in [`DecoderState::transition`] as a pure
//! function; [`Decoder`] applies the resulting [`Action`] to the receive
//! buffer and cursor.

use crate::address::NodeAddress;
use crate::buffer::FrameBuffer;
use crate::fmt::trace;
use crate::frame::{Command, DLE, ETX, PREAMBLE, STX};

/// Decoder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    /// Waiting for the first 0xFF
    #[default]
    Preamble1,
    /// Waiting for the second 0xFF
    Preamble2,
    /// Waiting for STX
    Preamble3,
    /// Next byte is the address
    Address,
    /// Frame is ours, next byte is the command
    DecodeCommand,
    /// Frame is for another node, command byte is skipped
    IgnoreCommand,
    /// Storing payload bytes
    DecodeData,
    /// Previous byte was DLE, store the next one literally
    DecodeEscData,
    /// Skipping a foreign payload
    IgnoreData,
    /// Skipping the byte after a DLE in a foreign payload
    IgnoreEscData,
    /// Unknown command, one byte is dropped before resync
    PostambleOther,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Nothing to do
    None,
    /// Rewind the receive cursor to 0
    ResetCursor,
    /// Store a payload byte at the cursor
    Store(u8),
    /// Host polled this node, a response must be sent
    Poll,
    /// ETX ended a frame addressed to this node
    FrameComplete,
}

impl DecoderState {
    /// Compute the next state and side effect for `byte`
    ///
    /// `address` is this node's address, compared against the frame's
    /// address byte.
    pub fn transition(self, byte: u8, address: NodeAddress) -> (Self, Action) {
        use DecoderState::*;

        match self {
            Preamble1 => {
                let next = if byte == PREAMBLE { Preamble2 } else { Preamble1 };
                (next, Action::ResetCursor)
            }
            Preamble2 => {
                let next = if byte == PREAMBLE { Preamble3 } else { Preamble1 };
                (next, Action::None)
            }
            Preamble3 => {
                let next = if byte == STX { Address } else { Preamble1 };
                (next, Action::None)
            }
            Address => {
                let next = if address.matches(byte) {
                    DecodeCommand
                } else {
                    IgnoreCommand
                };
                (next, Action::None)
            }
            DecodeCommand => match Command::from_byte(byte) {
                Some(Command::Transmit) => (DecodeData, Action::None),
                Some(Command::Poll) => (Preamble1, Action::Poll),
                _ => (PostambleOther, Action::None),
            },
            IgnoreCommand => (IgnoreData, Action::None),
            DecodeData => match byte {
                DLE => (DecodeEscData, Action::None),
                ETX => (Preamble1, Action::FrameComplete),
                _ => (DecodeData, Action::Store(byte)),
            },
            DecodeEscData => (DecodeData, Action::Store(byte)),
            IgnoreData => match byte {
                DLE => (IgnoreEscData, Action::None),
                ETX => (Preamble1, Action::None),
                _ => (IgnoreData, Action::None),
            },
            IgnoreEscData => (IgnoreData, Action::None),
            PostambleOther => (Preamble1, Action::None),
        }
    }
}

/// Events surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeEvent {
    /// A poll for this node was received
    PollRequested,
    /// A set-outputs frame for this node finished; `len` bytes were stored
    DataReceived { len: usize },
}

/// Receive state machine plus write cursor
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decoder {
    state: DecoderState,
    cursor: usize,
}

impl Decoder {
    /// Create a decoder waiting for a preamble
    pub const fn new() -> Self {
        Self {
            state: DecoderState::Preamble1,
            cursor: 0,
        }
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.state = DecoderState::Preamble1;
        self.cursor = 0;
    }

    /// Current state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Index of the next payload byte to be written
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Feed a single byte
    ///
    /// Payload bytes are written into `rx` at the cursor. Bytes beyond the
    /// end of `rx` are dropped while the frame boundary is still tracked.
    pub fn feed(
        &mut self,
        byte: u8,
        address: NodeAddress,
        rx: &mut FrameBuffer,
    ) -> Option<DecodeEvent> {
        let (next, action) = self.state.transition(byte, address);
        self.state = next;

        match action {
            Action::None => None,
            Action::ResetCursor => {
                self.cursor = 0;
                None
            }
            Action::Store(value) => {
                if rx.set(self.cursor, value).is_ok() {
                    self.cursor += 1;
                } else {
                    trace!("payload byte dropped at {}", self.cursor);
                }
                None
            }
            Action::Poll => Some(DecodeEvent::PollRequested),
            Action::FrameComplete => Some(DecodeEvent::DataReceived { len: self.cursor }),
        }
    }
}
