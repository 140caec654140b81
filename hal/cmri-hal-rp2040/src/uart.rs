//! UART support
//!
//! RP2040 has two UART peripherals (UART0 and UART1), each reachable from a
//! fixed set of GPIOs.

use embassy_rp::uart::{Config, DataBits, Parity, StopBits};
use embedded_io::{ErrorType, Read, ReadReady, Write};

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

impl UartId {
    /// Map a configured channel number
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(UartId::Uart0),
            1 => Some(UartId::Uart1),
            _ => None,
        }
    }
}

/// Determine which UART can use a given GPIO pin
pub fn gpio_to_uart(gpio: u8) -> Option<UartId> {
    // UART0: GPIO 0/1, 12/13, 16/17, 28/29
    // UART1: GPIO 4/5, 8/9, 20/21, 24/25
    match gpio {
        0 | 1 | 12 | 13 | 16 | 17 | 28 | 29 => Some(UartId::Uart0),
        4 | 5 | 8 | 9 | 20 | 21 | 24 | 25 => Some(UartId::Uart1),
        _ => None,
    }
}

/// Translate a bus line format into an embassy-rp UART config
pub fn uart_config(line: &cmri_hal::UartConfig) -> Config {
    let mut config = Config::default();
    config.baudrate = line.baudrate;
    config.data_bits = match line.data_bits {
        cmri_hal::uart::DataBits::Seven => DataBits::DataBits7,
        cmri_hal::uart::DataBits::Eight => DataBits::DataBits8,
    };
    config.parity = match line.parity {
        cmri_hal::uart::Parity::None => Parity::ParityNone,
        cmri_hal::uart::Parity::Even => Parity::ParityEven,
        cmri_hal::uart::Parity::Odd => Parity::ParityOdd,
    };
    config.stop_bits = match line.stop_bits {
        cmri_hal::uart::StopBits::One => StopBits::STOP1,
        cmri_hal::uart::StopBits::Two => StopBits::STOP2,
    };
    config
}

/// Blocking `cmri-hal` UART over any `embedded-io` serial port
///
/// Reads only what is already buffered, so the node's polling loop never
/// stalls on a quiet line.
pub struct SerialPort<T> {
    inner: T,
}

impl<T> SerialPort<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Write + ErrorType> cmri_hal::UartTx for SerialPort<T> {
    type Error = T::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

impl<T: Read + ReadReady + ErrorType> cmri_hal::UartRx for SerialPort<T> {
    type Error = T::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || !self.inner.read_ready()? {
            return Ok(0);
        }
        self.inner.read(buf)
    }
}
