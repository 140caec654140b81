//! RP2040-specific HAL for C/MRI nodes
//!
//! This crate provides RP2040 implementations of the `cmri-hal` traits:
//!
//! - [`SerialPort`]: `UartTx`/`UartRx` over an embassy-rp buffered UART
//! - [`RpOutput`]: `OutputPin` over an embassy-rp GPIO output
//! - [`BlockingDelay`]: `Delay` backed by the embassy time driver
//! - UART pin mapping helpers

#![no_std]

pub mod delay;
pub mod gpio;
pub mod uart;

pub use delay::BlockingDelay;
pub use gpio::{is_valid_gpio, RpOutput};
pub use uart::{gpio_to_uart, uart_config, SerialPort, UartId};
