//! Board wiring
//!
//! The bus pins are fixed by the PCB. Config values that disagree are
//! reported but the board wiring wins.

use defmt::*;

use cmri_core::NodeConfig;
use cmri_hal_rp2040::{gpio_to_uart, is_valid_gpio, UartId};

/// UART0 TX
pub const BUS_TX_PIN: u8 = 12;
/// UART0 RX
pub const BUS_RX_PIN: u8 = 13;
/// RS-485 driver enable
pub const BUS_TX_ENABLE_PIN: u8 = 3;

/// Warn about config entries that do not match the board
pub fn check_wiring(config: &NodeConfig) {
    for (name, pin) in [
        ("tx_pin", config.tx_pin),
        ("rx_pin", config.rx_pin),
        ("tx_enable_pin", config.tx_enable_pin),
    ] {
        if !is_valid_gpio(pin) {
            warn!("Config {}=gpio{} does not exist on RP2040", name, pin);
        }
    }
    if UartId::from_index(config.uart) != gpio_to_uart(BUS_TX_PIN) {
        warn!("Config selects UART{} but the bus is wired to UART0", config.uart);
    }
    if config.tx_pin != BUS_TX_PIN || config.rx_pin != BUS_RX_PIN {
        warn!(
            "Config pins tx=gpio{} rx=gpio{}, board uses gpio{}/gpio{}",
            config.tx_pin, config.rx_pin, BUS_TX_PIN, BUS_RX_PIN
        );
    }
    if config.tx_enable_pin != BUS_TX_ENABLE_PIN {
        warn!(
            "Config tx_enable=gpio{}, board uses gpio{}",
            config.tx_enable_pin, BUS_TX_ENABLE_PIN
        );
    }
}
