//! GPIO outputs

use embassy_rp::gpio::Output;

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: u8 = 30;

/// Check a configured pin number against the chip
pub fn is_valid_gpio(pin: u8) -> bool {
    pin < GPIO_COUNT
}

/// embassy-rp output driving a `cmri-hal` pin
pub struct RpOutput<'d> {
    pin: Output<'d>,
}

impl<'d> RpOutput<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

impl cmri_hal::OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}
