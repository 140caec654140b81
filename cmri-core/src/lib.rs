//! Board-agnostic C/MRI node
//!
//! This crate ties the protocol state machine to hardware through the
//! `cmri-hal` traits:
//!
//! - [`Node`]: owned context holding the address, both frame buffers, the
//!   decoder and the UART/transmit-enable/delay handles
//! - Bit and byte accessors for application I/O
//! - [`BusGuard`]: scoped transmit-enable for the half-duplex line
//! - [`NodeConfig`] and its TOML loader
//!
//! # Example
//!
//! ```ignore
//! let mut node = Node::initialize(NodeConfig::default(), uart, tx_enable, delay)?;
//! loop {
//!     node.process()?;
//!     led.set_level(node.get_bit(0)?.into());
//!     node.set_bit(0, button.is_high())?;
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod bus;
pub mod config;
pub mod node;

#[cfg(test)]
mod testutil;

pub use bus::BusGuard;
pub use config::{parse_config, ConfigError, NodeConfig, ParseError};
pub use node::{AccessError, Node, NodeError, RawChunk, READ_CHUNK, TX_SETTLE_MS};

pub use cmri_protocol::{DecodeEvent, DecoderState, NodeAddress};
