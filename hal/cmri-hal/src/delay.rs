//! Blocking delay abstraction

/// Blocking delay provider
///
/// Used where the bus requires a fixed hold time that must not be
/// interleaved with other work, such as keeping the transceiver driving
/// the line until the last stop bit has left the shift register.
pub trait Delay {
    /// Block for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

