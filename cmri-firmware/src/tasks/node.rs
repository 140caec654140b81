//! Bus polling task
//!
//! Drains the UART into the node, then mirrors host outputs onto the board
//! and refreshes the inputs reported on the next poll.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::uart::BufferedUart;
use embassy_time::{Duration, Ticker};

use cmri_core::{Node, NodeError};
use cmri_hal_rp2040::{BlockingDelay, RpOutput, SerialPort};

/// Concrete node type for this board
pub type BoardNode = Node<SerialPort<BufferedUart>, RpOutput<'static>, BlockingDelay>;

/// Pattern reported on input bits 0..3
const INPUT_PATTERN: [bool; 4] = [true, false, true, true];

/// Node task - runs the decoder and application I/O
#[embassy_executor::task]
pub async fn node_task(mut node: BoardNode, mut led: Output<'static>) {
    info!("Node task started");

    // At 115200 baud a 64-byte chunk arrives in ~5.5 ms
    let mut ticker = Ticker::every(Duration::from_millis(1));

    loop {
        match node.process() {
            Ok(raw) if !raw.is_empty() => trace!("RX: {} bytes", raw.len()),
            Ok(_) => {}
            Err(NodeError::Transmit(e)) => warn!("Poll response failed: {:?}", e),
            Err(e) => warn!("Bus error: {:?}", e),
        }

        // Output bit 0 drives the on-board LED
        match node.get_bit(0) {
            Ok(on) => led.set_level(on.into()),
            Err(_) => led.set_low(),
        }

        for (bit, &value) in INPUT_PATTERN.iter().enumerate() {
            if node.set_bit(bit, value).is_err() {
                break;
            }
        }

        ticker.next().await;
    }
}
