//! The node context
//!
//! A [`Node`] owns the address, both frame buffers, the decoder state and
//! cursor, plus the hardware handles. One `&mut Node` is one control
//! thread; if the node is shared between tasks, wrap the whole value in a
//! single mutex so buffers and cursor stay consistent.

use heapless::Vec;

use cmri_hal::{Delay, OutputPin, UartRx, UartTx};
use cmri_protocol::{
    encode_response, BufferError, DecodeEvent, Decoder, DecoderState, FrameBuffer, FrameError,
    NodeAddress, MAX_FRAME_SIZE,
};

use crate::bus::BusGuard;
use crate::config::{ConfigError, NodeConfig};
use crate::fmt::{debug, info, trace};

/// Time transmit enable stays asserted after the last byte is written (ms)
///
/// Covers the final characters draining from the UART at 9600 baud.
pub const TX_SETTLE_MS: u32 = 10;

/// Most bytes pulled from the UART per [`Node::process`] call
pub const READ_CHUNK: usize = 64;

/// Raw bytes consumed by one [`Node::process`] call
pub type RawChunk = Vec<u8, READ_CHUNK>;

/// UART error type of a node's serial port
pub type UartError<U> = <U as UartTx>::Error;

/// Accessor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// Bit or byte position is outside the configured buffer
    OutOfRange,
}

impl From<BufferError> for AccessError {
    fn from(_: BufferError) -> Self {
        AccessError::OutOfRange
    }
}

/// Node operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError<E> {
    /// Configuration rejected
    Config(ConfigError),
    /// Response could not be framed
    Encode(FrameError),
    /// The UART failed while sending; the frame is not retried
    Transmit(E),
    /// The UART failed while reading
    Receive(E),
}

impl<E> From<ConfigError> for NodeError<E> {
    fn from(e: ConfigError) -> Self {
        NodeError::Config(e)
    }
}

impl<E> From<FrameError> for NodeError<E> {
    fn from(e: FrameError) -> Self {
        NodeError::Encode(e)
    }
}

/// A C/MRI node on a half-duplex serial bus
pub struct Node<U, P, D> {
    config: NodeConfig,
    rx: FrameBuffer,
    tx: FrameBuffer,
    decoder: Decoder,
    uart: U,
    tx_enable: P,
    delay: D,
}

impl<U, P, D> Node<U, P, D>
where
    U: UartTx + UartRx<Error = <U as UartTx>::Error>,
    P: OutputPin,
    D: Delay,
{
    /// Build a node with zeroed buffers and the bus released
    pub fn new(config: NodeConfig, uart: U, mut tx_enable: P, delay: D) -> Result<Self, ConfigError> {
        let (rx, tx) = allocate_buffers(&config)?;
        tx_enable.set_low();

        Ok(Self {
            config,
            rx,
            tx,
            decoder: Decoder::new(),
            uart,
            tx_enable,
            delay,
        })
    }

    /// Build a node and announce it with one response frame
    ///
    /// The announce carries the freshly zeroed transmit buffer.
    pub fn initialize(
        config: NodeConfig,
        uart: U,
        tx_enable: P,
        delay: D,
    ) -> Result<Self, NodeError<UartError<U>>> {
        let mut node = Self::new(config, uart, tx_enable, delay)?;
        info!(
            "C/MRI node {} ready: {} bytes in, {} bytes out",
            node.config.address.get(),
            node.config.receive_bytes,
            node.config.transmit_bytes
        );
        node.transmit()?;
        Ok(node)
    }

    /// Apply a new configuration
    ///
    /// Both buffers are reallocated and zeroed and the decoder restarts at
    /// the preamble. On error nothing changes.
    pub fn reconfigure(&mut self, config: NodeConfig) -> Result<(), ConfigError> {
        let (rx, tx) = allocate_buffers(&config)?;
        self.rx = rx;
        self.tx = tx;
        self.config = config;
        self.decoder.reset();
        debug!("reconfigured as node {}", self.config.address.get());
        Ok(())
    }

    /// Change the address this node answers to
    pub fn set_address(&mut self, address: NodeAddress) {
        debug!("address {} -> {}", self.config.address.get(), address.get());
        self.config.address = address;
    }

    pub fn address(&self) -> NodeAddress {
        self.config.address
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn decoder_state(&self) -> DecoderState {
        self.decoder.state()
    }

    /// Last payload received from the host
    pub fn receive_buffer(&self) -> &[u8] {
        self.rx.as_slice()
    }

    /// Payload sent with the next response
    pub fn transmit_buffer(&self) -> &[u8] {
        self.tx.as_slice()
    }

    /// Read every byte the UART has pending and run it through the decoder
    ///
    /// Polls addressed to this node are answered before this returns.
    /// Returns the raw bytes read so callers can log them. If a response
    /// fails, the rest of the chunk is still decoded and the first
    /// failure is returned.
    pub fn process(&mut self) -> Result<RawChunk, NodeError<UartError<U>>> {
        let mut buf = [0u8; READ_CHUNK];
        let n = self
            .uart
            .read_available(&mut buf)
            .map_err(NodeError::Receive)?;
        let raw = &buf[..n];

        if self.config.debug && !raw.is_empty() {
            debug!("RX {:?}", raw);
        }

        // The chunk is already drained from the UART, so a failed poll
        // response must not stop the remaining bytes from being decoded.
        let mut failure = None;
        for &byte in raw {
            if let Err(e) = self.feed(byte) {
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(raw.iter().copied().collect()),
        }
    }

    /// Advance the decoder by one byte
    ///
    /// A poll for this node triggers [`transmit`](Self::transmit) before
    /// the event is returned.
    pub fn feed(&mut self, byte: u8) -> Result<Option<DecodeEvent>, NodeError<UartError<U>>> {
        let event = self.decoder.feed(byte, self.config.address, &mut self.rx);

        match event {
            Some(DecodeEvent::PollRequested) => {
                trace!("poll");
                self.transmit()?;
            }
            Some(DecodeEvent::DataReceived { len }) => trace!("outputs updated, {} bytes", len),
            None => {}
        }

        Ok(event)
    }

    /// Send the transmit buffer to the host
    ///
    /// Holds the bus for the write plus [`TX_SETTLE_MS`]. A UART failure
    /// is returned as [`NodeError::Transmit`] after the bus is released.
    pub fn transmit(&mut self) -> Result<(), NodeError<UartError<U>>> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = encode_response(self.config.address, self.tx.as_slice(), &mut frame)?;
        let frame = &frame[..len];

        if self.config.debug {
            debug!("TX {:?}", frame);
        }

        let _bus = BusGuard::acquire(&mut self.tx_enable, &mut self.delay, TX_SETTLE_MS);
        self.uart.write_blocking(frame).map_err(NodeError::Transmit)?;
        self.uart.flush().map_err(NodeError::Transmit)?;
        Ok(())
    }

    /// Read output bit `position` as set by the host
    ///
    /// Bit 0 is the least significant bit of byte 0. Positions beyond the
    /// receive buffer return [`AccessError::OutOfRange`].
    pub fn get_bit(&self, position: usize) -> Result<bool, AccessError> {
        let byte = self.get_byte(position / 8)?;
        Ok((byte >> (position % 8)) & 0x01 == 1)
    }

    /// Read output byte `position` as set by the host
    pub fn get_byte(&self, position: usize) -> Result<u8, AccessError> {
        Ok(self.rx.get(position)?)
    }

    /// Set or clear input bit `position` for the next response
    ///
    /// Other bits in the same byte are left untouched. Out-of-range
    /// positions fail without modifying the buffer.
    pub fn set_bit(&mut self, position: usize, value: bool) -> Result<(), AccessError> {
        if position.saturating_add(7) / 8 > self.tx.len() {
            return Err(AccessError::OutOfRange);
        }
        let index = position / 8;
        let mask = 1u8 << (position % 8);
        let byte = self.tx.get(index)?;
        let byte = if value { byte | mask } else { byte & !mask };
        self.tx.set(index, byte)?;
        Ok(())
    }

    /// Set input byte `position` for the next response
    ///
    /// Out-of-range positions fail without modifying the buffer.
    pub fn set_byte(&mut self, position: usize, byte: u8) -> Result<(), AccessError> {
        // Position equal to the length passes this gate and is refused by
        // the buffer itself.
        if position > self.tx.len() {
            return Err(AccessError::OutOfRange);
        }
        self.tx.set(position, byte)?;
        Ok(())
    }

    /// Give back the hardware handles
    pub fn release(self) -> (U, P, D) {
        (self.uart, self.tx_enable, self.delay)
    }
}

fn allocate_buffers(config: &NodeConfig) -> Result<(FrameBuffer, FrameBuffer), ConfigError> {
    config.validate()?;
    let rx = FrameBuffer::allocate(config.receive_bytes).map_err(|_| ConfigError::ReceiveTooLarge)?;
    let tx =
        FrameBuffer::allocate(config.transmit_bytes).map_err(|_| ConfigError::TransmitTooLarge)?;
    Ok((rx, tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Bus, BusEvent, MockDelay, MockError, MockPin, MockUart};
    use proptest::prelude::*;

    type TestNode = Node<MockUart, MockPin, MockDelay>;

    fn config(receive_bytes: usize, transmit_bytes: usize, address: u8) -> NodeConfig {
        NodeConfig {
            receive_bytes,
            transmit_bytes,
            address: NodeAddress::new(address).unwrap(),
            ..NodeConfig::default()
        }
    }

    fn harness(config: NodeConfig) -> (TestNode, Bus) {
        let bus = Bus::new();
        let node = Node::new(config, bus.uart(), bus.pin(), bus.delay()).unwrap();
        bus.clear_events();
        (node, bus)
    }

    fn tx_bit(node: &TestNode, position: usize) -> bool {
        (node.transmit_buffer()[position / 8] >> (position % 8)) & 1 == 1
    }

    #[test]
    fn test_new_releases_bus() {
        let bus = Bus::new();
        let node = Node::new(NodeConfig::default(), bus.uart(), bus.pin(), bus.delay()).unwrap();
        assert_eq!(bus.events(), [BusEvent::EnableLow]);
        assert_eq!(node.receive_buffer(), &[0u8; 6]);
        assert_eq!(node.transmit_buffer(), &[0u8; 3]);
        assert_eq!(node.decoder_state(), DecoderState::Preamble1);
    }

    #[test]
    fn test_initialize_announces() {
        let bus = Bus::new();
        let node =
            Node::initialize(NodeConfig::default(), bus.uart(), bus.pin(), bus.delay()).unwrap();

        assert_eq!(
            bus.events(),
            [
                BusEvent::EnableLow,
                BusEvent::EnableHigh,
                BusEvent::Write(vec![0xFF, 0xFF, 0x02, 0x42, b'R', 0, 0, 0, 0x03]),
                BusEvent::Flush,
                BusEvent::Delay(TX_SETTLE_MS),
                BusEvent::EnableLow,
            ]
        );
        assert_eq!(node.address().get(), 1);
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let bus = Bus::new();
        let result = Node::initialize(config(300, 3, 1), bus.uart(), bus.pin(), bus.delay());
        assert!(matches!(
            result,
            Err(NodeError::Config(ConfigError::ReceiveTooLarge))
        ));
        assert!(bus.frames().is_empty());
    }

    #[test]
    fn test_set_outputs_frame() {
        let (mut node, bus) = harness(config(6, 3, 1));
        let wire = [0xFF, 0xFF, 0x02, 0x42, 0x54, 0x01, 0x02, 0x10, 0x03, 0x04, 0x03];
        bus.inject(&wire);

        let raw = node.process().unwrap();

        assert_eq!(&raw[..], &wire[..]);
        assert_eq!(node.receive_buffer(), &[0x01, 0x02, 0x03, 0x04, 0x00, 0x00]);
        assert!(bus.frames().is_empty());
        assert_eq!(node.decoder_state(), DecoderState::Preamble1);
    }

    #[test]
    fn test_poll_sends_transmit_buffer() {
        let (mut node, bus) = harness(config(6, 3, 1));
        node.set_bit(0, true).unwrap();
        node.set_bit(2, true).unwrap();
        node.set_bit(3, true).unwrap();
        node.set_byte(2, 0x80).unwrap();

        bus.inject(&[0xFF, 0xFF, 0x02, b'B', b'P', 0x03]);
        node.process().unwrap();

        assert_eq!(
            bus.frames(),
            [vec![0xFF, 0xFF, 0x02, 0x42, b'R', 0x0D, 0x00, 0x80, 0x03]]
        );
        assert_eq!(
            bus.events().last(),
            Some(&BusEvent::EnableLow),
            "bus must be released after the response"
        );
    }

    #[test]
    fn test_response_payload_sent_unescaped() {
        let (mut node, bus) = harness(config(1, 2, 0));
        node.set_byte(0, 0x03).unwrap();
        node.set_byte(1, 0x10).unwrap();

        node.transmit().unwrap();

        assert_eq!(
            bus.frames(),
            [vec![0xFF, 0xFF, 0x02, b'A', b'R', 0x03, 0x10, 0x03]]
        );
    }

    #[test]
    fn test_feed_reports_events() {
        let (mut node, bus) = harness(config(2, 1, 1));
        let mut events = std::vec::Vec::new();
        for byte in [0xFF, 0xFF, 0x02, b'B', b'T', 0xAA, 0x03, 0xFF, 0xFF, 0x02, b'B', b'P'] {
            if let Some(event) = node.feed(byte).unwrap() {
                events.push(event);
            }
        }

        assert_eq!(
            events,
            [
                DecodeEvent::DataReceived { len: 1 },
                DecodeEvent::PollRequested
            ]
        );
        assert_eq!(bus.frames().len(), 1);
    }

    #[test]
    fn test_foreign_frames_ignored() {
        let (mut node, bus) = harness(config(4, 2, 1));
        bus.inject(&[0xFF, 0xFF, 0x02, b'A', b'P', 0x03]);
        bus.inject(&[0xFF, 0xFF, 0x02, b'C', b'T', 0xFF, 0xFF, 0x02, b'B', b'P', 0x03]);

        node.process().unwrap();

        assert!(bus.frames().is_empty());
        assert_eq!(node.receive_buffer(), &[0u8; 4]);
    }

    #[test]
    fn test_set_address() {
        let (mut node, bus) = harness(config(2, 1, 1));
        node.set_address(NodeAddress::new(2).unwrap());

        bus.inject(&[0xFF, 0xFF, 0x02, b'B', b'P', 0x03]);
        node.process().unwrap();
        assert!(bus.frames().is_empty());

        bus.inject(&[0xFF, 0xFF, 0x02, b'C', b'P', 0x03]);
        node.process().unwrap();
        assert_eq!(bus.frames(), [vec![0xFF, 0xFF, 0x02, b'C', b'R', 0x00, 0x03]]);
    }

    #[test]
    fn test_transmit_failure_not_retried() {
        let (mut node, bus) = harness(config(2, 1, 1));
        bus.fail_writes(true);

        assert_eq!(node.transmit(), Err(NodeError::Transmit(MockError)));
        assert_eq!(
            bus.events(),
            [
                BusEvent::EnableHigh,
                BusEvent::Delay(TX_SETTLE_MS),
                BusEvent::EnableLow
            ]
        );
    }

    #[test]
    fn test_poll_failure_surfaces_from_process() {
        let (mut node, bus) = harness(config(2, 1, 1));
        bus.fail_writes(true);
        bus.inject(&[0xFF, 0xFF, 0x02, b'B', b'P', 0x03]);

        assert_eq!(node.process(), Err(NodeError::Transmit(MockError)));
        assert_eq!(bus.events().last(), Some(&BusEvent::EnableLow));
    }

    #[test]
    fn test_failed_poll_keeps_decoding_chunk() {
        let (mut node, bus) = harness(config(2, 1, 1));
        bus.fail_writes(true);
        bus.inject(&[
            0xFF, 0xFF, 0x02, b'B', b'P', 0xFF, 0xFF, 0x02, b'B', b'T', 0x11, 0x22, 0x03,
        ]);

        assert_eq!(node.process(), Err(NodeError::Transmit(MockError)));
        assert_eq!(bus.pending(), 0);
        assert_eq!(node.receive_buffer(), &[0x11, 0x22]);
        assert_eq!(node.decoder_state(), DecoderState::Preamble1);

        bus.fail_writes(false);
        bus.inject(&[0xFF, 0xFF, 0x02, b'B', b'P', 0x03]);
        node.process().unwrap();
        assert_eq!(bus.frames(), [vec![0xFF, 0xFF, 0x02, b'B', b'R', 0x00, 0x03]]);
    }

    #[test]
    fn test_receive_failure() {
        let (mut node, bus) = harness(config(2, 1, 1));
        bus.fail_reads(true);
        assert_eq!(node.process(), Err(NodeError::Receive(MockError)));
    }

    #[test]
    fn test_process_reads_one_chunk() {
        let (mut node, bus) = harness(config(2, 1, 1));
        bus.inject(&[0u8; READ_CHUNK + 36]);

        assert_eq!(node.process().unwrap().len(), READ_CHUNK);
        assert_eq!(bus.pending(), 36);
        assert_eq!(node.process().unwrap().len(), 36);
        assert!(node.process().unwrap().is_empty());
    }

    #[test]
    fn test_get_bit_and_byte() {
        let (mut node, bus) = harness(config(2, 1, 1));
        bus.inject(&[0xFF, 0xFF, 0x02, b'B', b'T', 0b0000_0101, 0x80, 0x03]);
        node.process().unwrap();

        assert_eq!(node.get_bit(0), Ok(true));
        assert_eq!(node.get_bit(1), Ok(false));
        assert_eq!(node.get_bit(2), Ok(true));
        assert_eq!(node.get_bit(15), Ok(true));
        assert_eq!(node.get_byte(1), Ok(0x80));
        assert_eq!(node.get_bit(16), Err(AccessError::OutOfRange));
        assert_eq!(node.get_byte(2), Err(AccessError::OutOfRange));
    }

    #[test]
    fn test_set_byte_bounds() {
        let (mut node, _bus) = harness(config(6, 3, 1));
        assert_eq!(node.set_byte(2, 0x55), Ok(()));
        // Equal to the length passes the gate but is still out of range
        assert_eq!(node.set_byte(3, 0xAA), Err(AccessError::OutOfRange));
        assert_eq!(node.set_byte(4, 0xAA), Err(AccessError::OutOfRange));
        assert_eq!(node.transmit_buffer(), &[0x00, 0x00, 0x55]);
    }

    #[test]
    fn test_set_bit_bounds() {
        let (mut node, _bus) = harness(config(6, 3, 1));
        assert_eq!(node.set_bit(23, true), Ok(()));
        assert_eq!(node.set_bit(24, true), Err(AccessError::OutOfRange));
        assert_eq!(node.set_bit(25, true), Err(AccessError::OutOfRange));
        assert_eq!(node.set_bit(usize::MAX, true), Err(AccessError::OutOfRange));
        assert_eq!(node.transmit_buffer(), &[0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_reconfigure() {
        let (mut node, bus) = harness(config(2, 1, 1));
        node.set_byte(0, 0xFF).unwrap();
        bus.inject(&[0xFF, 0xFF, 0x02, b'B', b'T', 0x01]);
        node.process().unwrap();
        assert_eq!(node.decoder_state(), DecoderState::DecodeData);

        node.reconfigure(config(8, 4, 3)).unwrap();

        assert_eq!(node.receive_buffer(), &[0u8; 8]);
        assert_eq!(node.transmit_buffer(), &[0u8; 4]);
        assert_eq!(node.address().get(), 3);
        assert_eq!(node.decoder_state(), DecoderState::Preamble1);
    }

    #[test]
    fn test_reconfigure_rejected_keeps_state() {
        let (mut node, _bus) = harness(config(2, 1, 1));
        node.set_byte(0, 0x42).unwrap();

        assert_eq!(
            node.reconfigure(config(2, 1000, 1)),
            Err(ConfigError::TransmitTooLarge)
        );
        assert_eq!(node.transmit_buffer(), &[0x42]);
        assert_eq!(node.config().transmit_bytes, 1);
    }

    #[test]
    fn test_release_returns_handles() {
        let (node, _bus) = harness(config(2, 1, 1));
        let (_uart, pin, _delay) = node.release();
        assert!(pin.is_set_low());
    }

    proptest! {
        #[test]
        fn prop_set_bit_touches_only_its_bit(
            initial in prop::array::uniform3(any::<u8>()),
            position in 0usize..24,
            value in any::<bool>()
        ) {
            let (mut node, _bus) = harness(config(6, 3, 1));
            for (i, &b) in initial.iter().enumerate() {
                node.set_byte(i, b).unwrap();
            }

            prop_assert_eq!(node.set_bit(position, value), Ok(()));

            for p in 0..24 {
                let expected = if p == position {
                    value
                } else {
                    (initial[p / 8] >> (p % 8)) & 1 == 1
                };
                prop_assert_eq!(tx_bit(&node, p), expected);
            }
        }

        #[test]
        fn prop_set_then_clear(position in 0usize..24) {
            let (mut node, _bus) = harness(config(6, 3, 1));
            node.set_bit(position, true).unwrap();
            prop_assert!(tx_bit(&node, position));
            node.set_bit(position, false).unwrap();
            prop_assert!(!tx_bit(&node, position));
            prop_assert_eq!(node.transmit_buffer(), &[0u8; 3]);
        }

        #[test]
        fn prop_out_of_range_leaves_buffers(
            initial in prop::array::uniform3(any::<u8>()),
            bit in 24usize..10_000,
            byte_pos in 3usize..10_000,
            value in any::<u8>()
        ) {
            let (mut node, _bus) = harness(config(6, 3, 1));
            for (i, &b) in initial.iter().enumerate() {
                node.set_byte(i, b).unwrap();
            }

            prop_assert_eq!(node.set_bit(bit, true), Err(AccessError::OutOfRange));
            prop_assert_eq!(node.set_bit(bit, false), Err(AccessError::OutOfRange));
            prop_assert_eq!(node.set_byte(byte_pos, value), Err(AccessError::OutOfRange));
            prop_assert_eq!(node.transmit_buffer(), &initial[..]);
            prop_assert_eq!(node.receive_buffer(), &[0u8; 6]);
        }
    }
}
