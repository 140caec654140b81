//! Test doubles for the hardware traits
//!
//! All doubles created from one [`Bus`] append to a shared event log so
//! tests can assert the ordering of enable, write and settle.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use cmri_hal::{Delay, OutputPin, UartRx, UartTx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    EnableHigh,
    EnableLow,
    Write(Vec<u8>),
    Flush,
    Delay(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

#[derive(Default)]
struct Shared {
    events: Vec<BusEvent>,
    incoming: VecDeque<u8>,
    fail_writes: bool,
    fail_reads: bool,
}

/// Handle onto the simulated line
#[derive(Clone, Default)]
pub struct Bus {
    shared: Rc<RefCell<Shared>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uart(&self) -> MockUart {
        MockUart { bus: self.clone() }
    }

    pub fn pin(&self) -> MockPin {
        MockPin {
            bus: self.clone(),
            high: false,
        }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { bus: self.clone() }
    }

    /// Queue bytes as if the host had sent them
    pub fn inject(&self, bytes: &[u8]) {
        self.shared.borrow_mut().incoming.extend(bytes.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.shared.borrow().incoming.len()
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.shared.borrow().events.clone()
    }

    /// Every buffer passed to `write_blocking`
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.shared
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                BusEvent::Write(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.shared.borrow_mut().events.clear();
    }

    pub fn fail_writes(&self, fail: bool) {
        self.shared.borrow_mut().fail_writes = fail;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.shared.borrow_mut().fail_reads = fail;
    }

    fn record(&self, event: BusEvent) {
        self.shared.borrow_mut().events.push(event);
    }
}

pub struct MockUart {
    bus: Bus,
}

impl UartTx for MockUart {
    type Error = MockError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.bus.shared.borrow().fail_writes {
            return Err(MockError);
        }
        self.bus.record(BusEvent::Write(data.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.bus.record(BusEvent::Flush);
        Ok(())
    }
}

impl UartRx for MockUart {
    type Error = MockError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut shared = self.bus.shared.borrow_mut();
        if shared.fail_reads {
            return Err(MockError);
        }
        let mut n = 0;
        while n < buf.len() {
            match shared.incoming.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

pub struct MockPin {
    bus: Bus,
    high: bool,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
        self.bus.record(BusEvent::EnableHigh);
    }

    fn set_low(&mut self) {
        self.high = false;
        self.bus.record(BusEvent::EnableLow);
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

pub struct MockDelay {
    bus: Bus,
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.bus.record(BusEvent::Delay(ms));
    }
}
