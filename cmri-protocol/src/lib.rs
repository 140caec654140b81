//! C/MRI Serial Bus Protocol
//!
//! This crate implements the node side of the C/MRI bus used to exchange
//! discrete I/O state between a supervisory host (e.g. JMRI) and remote
//! nodes sharing one half-duplex RS-485 line.
//!
//! # Protocol Overview
//!
//! Frames have no length prefix. They are delimited by a sync preamble and
//! an end-of-text marker:
//! ```text
//! ┌───────┬───────┬─────┬──────┬─────┬───────────────┬─────┐
//! │ 0xFF  │ 0xFF  │ STX │ ADDR │ CMD │ PAYLOAD       │ ETX │
//! │ 1B    │ 1B    │ 1B  │ 1B   │ 1B  │ 0–N B         │ 1B  │
//! └───────┴───────┴─────┴──────┴─────┴───────────────┴─────┘
//! ```
//!
//! `ADDR` is `'A'` plus the node address. Host-to-node payload bytes equal
//! to ETX or DLE are escaped with a leading DLE (`0x10`). Node-to-host
//! responses are sent unescaped.
//!
//! The receive side is a byte-at-a-time state machine ([`Decoder`]) that
//! never fails: malformed and foreign frames are absorbed by returning to
//! the preamble search.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod address;
pub mod buffer;
pub mod decoder;
pub mod frame;

pub use address::{NodeAddress, ADDRESS_BASE, MAX_NODE_ADDRESS};
pub use buffer::{BufferError, FrameBuffer, MAX_BUFFER_LEN};
pub use decoder::{Action, DecodeEvent, Decoder, DecoderState};
pub use frame::{
    encode_request, encode_response, Command, FrameError, DLE, ETX,
    MAX_FRAME_SIZE, MAX_REQUEST_SIZE, PREAMBLE, STX,
};
