//! Node addressing
//!
//! On the wire a node address travels as an offset from ASCII `'A'`, so
//! node 0 is `0x41`, node 1 is `0x42` and so on.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base byte that node addresses are offset from
pub const ADDRESS_BASE: u8 = b'A';

/// Highest node address a host can poll
pub const MAX_NODE_ADDRESS: u8 = 127;

/// Address of a node on the bus (0..=127)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct NodeAddress(u8);

impl NodeAddress {
    /// Create an address, rejecting values above [`MAX_NODE_ADDRESS`]
    pub const fn new(address: u8) -> Option<Self> {
        if address <= MAX_NODE_ADDRESS {
            Some(Self(address))
        } else {
            None
        }
    }

    /// Raw address value
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Wire representation (`'A' + address`)
    pub const fn to_byte(self) -> u8 {
        ADDRESS_BASE + self.0
    }

    /// Check whether a wire address byte selects this node
    pub fn matches(self, byte: u8) -> bool {
        byte.checked_sub(ADDRESS_BASE) == Some(self.0)
    }
}

impl TryFrom<u8> for NodeAddress {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<NodeAddress> for u8 {
    fn from(address: NodeAddress) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_byte() {
        assert_eq!(NodeAddress::new(0).unwrap().to_byte(), b'A');
        assert_eq!(NodeAddress::new(1).unwrap().to_byte(), 0x42);
        assert_eq!(NodeAddress::new(127).unwrap().to_byte(), 0xC0);
    }

    #[test]
    fn test_range() {
        assert!(NodeAddress::new(MAX_NODE_ADDRESS).is_some());
        assert!(NodeAddress::new(MAX_NODE_ADDRESS + 1).is_none());
        assert_eq!(NodeAddress::try_from(200), Err(200));
    }

    #[test]
    fn test_matches() {
        let addr = NodeAddress::new(1).unwrap();
        assert!(addr.matches(b'B'));
        assert!(!addr.matches(b'A'));
        assert!(!addr.matches(b'C'));
        // Below the base must not wrap around
        assert!(!addr.matches(0x00));
        assert!(!addr.matches(0x40));
    }
}
