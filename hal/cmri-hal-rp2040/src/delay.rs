//! Blocking delay on the embassy time driver

use embassy_time::{block_for, Duration};

/// Busy-waits on the global time driver
///
/// Used for the transmit-enable settle time, which must not yield to
/// other tasks while the transceiver is driving the bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingDelay;

impl cmri_hal::Delay for BlockingDelay {
    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}
