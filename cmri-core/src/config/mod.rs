//! Node configuration
//!
//! Everything here is fixed at startup. Buffers are sized from
//! `receive_bytes`/`transmit_bytes`; changing them later goes through
//! [`Node::reconfigure`](crate::Node::reconfigure), which reallocates and
//! zeroes both buffers.

mod toml;

pub use self::toml::{parse_config, ParseError};

use cmri_hal::UartConfig;
use cmri_protocol::{NodeAddress, MAX_BUFFER_LEN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `receive_bytes` exceeds the buffer limit
    ReceiveTooLarge,
    /// `transmit_bytes` exceeds the buffer limit
    TransmitTooLarge,
    /// Address outside 0..=127
    InvalidAddress,
    /// Baud rate of zero
    InvalidBaudrate,
}

/// Node configuration
///
/// Defaults describe an SMINI-style node: 48 outputs (6 bytes) driven by
/// the host and 24 inputs (3 bytes) reported back, at node address 1.
///
/// `uart` and the pin fields describe the wiring. Boards with fixed bus
/// pins only compare them against the PCB and never reroute from them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    /// Payload bytes accepted from the host
    pub receive_bytes: usize,
    /// Payload bytes sent in each response
    pub transmit_bytes: usize,
    /// UART peripheral index
    pub uart: u8,
    /// UART TX GPIO
    pub tx_pin: u8,
    /// UART RX GPIO
    pub rx_pin: u8,
    /// Line speed in bits per second
    pub baudrate: u32,
    /// This node's bus address
    pub address: NodeAddress,
    /// GPIO driving the transceiver's transmit enable
    pub tx_enable_pin: u8,
    /// Log raw traffic
    pub debug: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            receive_bytes: 6,
            transmit_bytes: 3,
            uart: 0,
            tx_pin: 0,
            rx_pin: 1,
            baudrate: 9600,
            address: NodeAddress::new(1).unwrap_or_default(),
            tx_enable_pin: 3,
            debug: false,
        }
    }
}

impl NodeConfig {
    /// Check limits that the node cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.receive_bytes > MAX_BUFFER_LEN {
            return Err(ConfigError::ReceiveTooLarge);
        }
        if self.transmit_bytes > MAX_BUFFER_LEN {
            return Err(ConfigError::TransmitTooLarge);
        }
        if self.baudrate == 0 {
            return Err(ConfigError::InvalidBaudrate);
        }
        Ok(())
    }

    /// UART settings for the bus (8 data bits, no parity, 2 stop bits)
    pub fn uart_config(&self) -> UartConfig {
        UartConfig::cmri(self.baudrate)
    }
}
