//! Fixed-length frame buffers
//!
//! A [`FrameBuffer`] is sized once when the node is configured and never
//! grows or shrinks afterwards. Storage is inline (`heapless`), so the
//! length is a runtime value bounded by [`MAX_BUFFER_LEN`].

use heapless::Vec;

/// Largest buffer a node can be configured with
pub const MAX_BUFFER_LEN: usize = 256;

/// Errors from buffer allocation and access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Index is at or beyond the configured length
    OutOfRange,
    /// Requested length exceeds [`MAX_BUFFER_LEN`]
    TooLarge,
}

/// Zero-initialised byte buffer with a length fixed at allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: Vec<u8, MAX_BUFFER_LEN>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of `size` bytes
    pub fn allocate(size: usize) -> Result<Self, BufferError> {
        let mut bytes = Vec::new();
        bytes
            .resize(size, 0)
            .map_err(|_| BufferError::TooLarge)?;
        Ok(Self { bytes })
    }

    /// Configured length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length buffer
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read the byte at `index`
    pub fn get(&self, index: usize) -> Result<u8, BufferError> {
        self.bytes.get(index).copied().ok_or(BufferError::OutOfRange)
    }

    /// Overwrite the byte at `index`
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), BufferError> {
        let slot = self.bytes.get_mut(index).ok_or(BufferError::OutOfRange)?;
        *slot = value;
        Ok(())
    }

    /// View the contents
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameBuffer {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FrameBuffer({=[u8]:x})", self.as_slice());
    }
}
