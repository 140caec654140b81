//! C/MRI Hardware Abstraction Layer
//!
//! This crate defines the hardware traits a C/MRI node needs from its
//! board: a UART on the shared RS-485 line, a transmit-enable output that
//! switches the transceiver into driving mode, and a blocking delay for the
//! line settle time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (cmri-firmware, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cmri-core (node context)               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cmri-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ cmri-hal-     │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (transmit enable, indicators)
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`delay::Delay`] - Blocking millisecond delay

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use delay::Delay;
pub use gpio::OutputPin;
pub use uart::{UartConfig, UartRx, UartTx};
