//! C/MRI node firmware
//!
//! Runs an RP2040 as a node on a C/MRI serial bus. The host (JMRI) writes
//! this node's outputs and polls its inputs over a half-duplex RS-485 line
//! driven through UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cmri_core::{parse_config, Node, NodeConfig};
use cmri_hal_rp2040::{uart_config, BlockingDelay, RpOutput, SerialPort};

mod board;
mod tasks;

/// Node configuration compiled into the firmware
const EMBEDDED_CONFIG: &str = include_str!("../node.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("C/MRI node starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    board::check_wiring(&config);

    // Bus UART (8N2, see NodeConfig::uart_config)
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_12, p.PIN_13, uart_config(&config.uart_config()));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    // Transceiver starts in receive mode
    let tx_enable = RpOutput::new(Output::new(p.PIN_3, Level::Low));
    // On-board LED
    let led = Output::new(p.PIN_25, Level::Low);

    let node = match Node::initialize(config, SerialPort::new(uart), tx_enable, BlockingDelay) {
        Ok(node) => node,
        Err(e) => defmt::panic!("Node init failed: {:?}", e),
    };

    spawner.spawn(tasks::node_task(node, led)).unwrap();
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> NodeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: node {} ({} out / {} in bytes) at {} baud",
                config.address.get(),
                config.receive_bytes,
                config.transmit_bytes,
                config.baudrate
            );
            config
        }
        Err(e) => {
            warn!("Invalid node.toml ({:?}), using defaults", e);
            NodeConfig::default()
        }
    }
}
