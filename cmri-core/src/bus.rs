//! Half-duplex bus access
//!
//! The node shares one RS-485 pair with every other node and the host. It
//! may only drive the line while answering, so the transceiver's transmit
//! enable is asserted for exactly the span of a write plus a settle time
//! that lets the final stop bits leave the UART before the driver turns
//! off.

use cmri_hal::{Delay, OutputPin};

/// Scoped ownership of the bus driver
///
/// Asserts transmit enable on [`acquire`](BusGuard::acquire). On drop,
/// holds the line for `settle_ms` and then releases it. Drop runs on every
/// exit path, so a failed write still releases the bus.
pub struct BusGuard<'a, P: OutputPin, D: Delay> {
    pin: &'a mut P,
    delay: &'a mut D,
    settle_ms: u32,
}

impl<'a, P: OutputPin, D: Delay> BusGuard<'a, P, D> {
    /// Drive transmit enable high and take the bus
    pub fn acquire(pin: &'a mut P, delay: &'a mut D, settle_ms: u32) -> Self {
        pin.set_high();
        Self {
            pin,
            delay,
            settle_ms,
        }
    }
}

impl<P: OutputPin, D: Delay> Drop for BusGuard<'_, P, D> {
    fn drop(&mut self) {
        self.delay.delay_ms(self.settle_ms);
        self.pin.set_low();
    }
}
