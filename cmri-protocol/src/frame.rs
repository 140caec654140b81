//! Frame encoding for the C/MRI bus.
//!
//! Frame format:
//! - PREAMBLE (2 bytes): 0xFF 0xFF synchronization
//! - STX (1 byte): 0x02 start of text
//! - ADDRESS (1 byte): `'A'` + node address
//! - COMMAND (1 byte): ASCII command letter
//! - PAYLOAD (0-N bytes): I/O state bytes
//! - ETX (1 byte): 0x03 end of text
//!
//! Requests from the host escape payload bytes equal to ETX or DLE with a
//! leading DLE. Responses from the node carry the payload verbatim; hosts
//! read a fixed number of bytes per node so they never look for ETX inside
//! the payload.

use crate::address::NodeAddress;
use crate::buffer::MAX_BUFFER_LEN;

/// Preamble byte, sent twice before STX
pub const PREAMBLE: u8 = 0xFF;

/// Start of text
pub const STX: u8 = 0x02;

/// End of text
pub const ETX: u8 = 0x03;

/// Data link escape, marks the next payload byte as literal
pub const DLE: u8 = 0x10;

/// PREAMBLE + PREAMBLE + STX + ADDRESS + COMMAND
pub const HEADER_LEN: usize = 5;

/// Largest response frame (header + full transmit buffer + ETX)
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + MAX_BUFFER_LEN + 1;

/// Largest request frame, with every payload byte escaped
pub const MAX_REQUEST_SIZE: usize = HEADER_LEN + 2 * MAX_BUFFER_LEN + 1;

/// Errors that can occur while encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Output buffer cannot hold the encoded frame
    BufferTooSmall,
    /// Payload exceeds [`MAX_BUFFER_LEN`]
    PayloadTooLarge,
}

/// Command letters used on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Host initialises a node (`'I'`)
    Initialize,
    /// Host sets the node's outputs (`'T'`)
    Transmit,
    /// Host asks for the node's inputs (`'P'`)
    Poll,
    /// Node answers a poll (`'R'`)
    Receive,
}

// Wire format values
const CMD_INITIALIZE: u8 = b'I';
const CMD_TRANSMIT: u8 = b'T';
const CMD_POLL: u8 = b'P';
const CMD_RECEIVE: u8 = b'R';

impl Command {
    /// Parse a command from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_INITIALIZE => Some(Command::Initialize),
            CMD_TRANSMIT => Some(Command::Transmit),
            CMD_POLL => Some(Command::Poll),
            CMD_RECEIVE => Some(Command::Receive),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Initialize => CMD_INITIALIZE,
            Command::Transmit => CMD_TRANSMIT,
            Command::Poll => CMD_POLL,
            Command::Receive => CMD_RECEIVE,
        }
    }
}

fn write_header(address: NodeAddress, command: Command, out: &mut [u8]) {
    out[0] = PREAMBLE;
    out[1] = PREAMBLE;
    out[2] = STX;
    out[3] = address.to_byte();
    out[4] = command.to_byte();
}

/// Encode a node response (`'R'`) carrying `payload` unescaped
///
/// Returns the number of bytes written
pub fn encode_response(
    address: NodeAddress,
    payload: &[u8],
    out: &mut [u8],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_BUFFER_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    let frame_len = HEADER_LEN + payload.len() + 1;
    if out.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    write_header(address, Command::Receive, out);
    out[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);
    out[frame_len - 1] = ETX;

    Ok(frame_len)
}

/// Encode a host request with DLE escaping applied to the payload
///
/// This is the framing a node's [`Decoder`](crate::Decoder) expects. Used
/// by host tooling and bus simulation.
///
/// Returns the number of bytes written
pub fn encode_request(
    address: NodeAddress,
    command: Command,
    payload: &[u8],
    out: &mut [u8],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_BUFFER_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    let escapes = payload.iter().filter(|&&b| b == ETX || b == DLE).count();
    let frame_len = HEADER_LEN + payload.len() + escapes + 1;
    if out.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    write_header(address, command, out);
    let mut pos = HEADER_LEN;
    for &byte in payload {
        if byte == ETX || byte == DLE {
            out[pos] = DLE;
            pos += 1;
        }
        out[pos] = byte;
        pos += 1;
    }
    out[pos] = ETX;

    Ok(frame_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> NodeAddress {
        NodeAddress::new(n).unwrap()
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::from_byte(b'T'), Some(Command::Transmit));
        assert_eq!(Command::from_byte(b'P'), Some(Command::Poll));
        assert_eq!(Command::from_byte(b'I'), Some(Command::Initialize));
        assert_eq!(Command::Receive.to_byte(), b'R');
        assert_eq!(Command::from_byte(b'X'), None);
    }

    #[test]
    fn test_response_layout() {
        let mut buffer = [0u8; 16];
        let len = encode_response(addr(1), &[0x0D, 0x00, 0x80], &mut buffer).unwrap();

        assert_eq!(len, 9);
        assert_eq!(
            &buffer[..len],
            &[0xFF, 0xFF, 0x02, 0x42, b'R', 0x0D, 0x00, 0x80, 0x03]
        );
    }

    #[test]
    fn test_response_not_escaped() {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = encode_response(addr(0), &[ETX, DLE], &mut buffer).unwrap();
        assert_eq!(&buffer[..len], &[0xFF, 0xFF, 0x02, b'A', b'R', 0x03, 0x10, 0x03]);
    }

    #[test]
    fn test_response_empty_payload() {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = encode_response(addr(5), &[], &mut buffer).unwrap();
        assert_eq!(&buffer[..len], &[0xFF, 0xFF, 0x02, b'F', b'R', 0x03]);
    }

    #[test]
    fn test_response_buffer_too_small() {
        let mut buffer = [0u8; 8];
        assert_eq!(
            encode_response(addr(1), &[1, 2, 3], &mut buffer),
            Err(FrameError::BufferTooSmall)
        );
    }

    #[test]
    fn test_response_payload_too_large() {
        let payload = [0u8; MAX_BUFFER_LEN + 1];
        let mut buffer = [0u8; MAX_FRAME_SIZE + 1];
        assert_eq!(
            encode_response(addr(1), &payload, &mut buffer),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_request_escapes_etx_and_dle() {
        let mut buffer = [0u8; 32];
        let len = encode_request(addr(1), Command::Transmit, &[0x01, 0x03, 0x10, 0x04], &mut buffer)
            .unwrap();

        assert_eq!(
            &buffer[..len],
            &[0xFF, 0xFF, 0x02, 0x42, b'T', 0x01, 0x10, 0x03, 0x10, 0x10, 0x04, 0x03]
        );
    }

    #[test]
    fn test_request_poll_has_no_payload() {
        let mut buffer = [0u8; 8];
        let len = encode_request(addr(3), Command::Poll, &[], &mut buffer).unwrap();
        assert_eq!(&buffer[..len], &[0xFF, 0xFF, 0x02, b'D', b'P', 0x03]);
    }
}
