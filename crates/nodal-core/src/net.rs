//! Net and terminal identifiers.

use std::fmt;

/// Unique identifier for an electrical net.
///
/// Net 0 is ground. Every other net owns one row/column in the MNA system
/// at index `id - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(pub(crate) u32);

impl NetId {
    /// The ground net (net 0).
    pub const GROUND: NetId = NetId(0);

    /// Create a new NetId from a raw value.
    pub fn new(id: u32) -> Self {
        NetId(id)
    }

    /// Get the raw net ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Check if this is the ground net.
    pub fn is_ground(self) -> bool {
        self.0 == 0
    }

    /// MNA matrix index of this net (`None` for ground).
    pub fn mna_index(self) -> Option<usize> {
        if self.is_ground() {
            None
        } else {
            Some((self.0 - 1) as usize)
        }
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Interned handle for one device terminal.
///
/// Handles are dense indices into the terminal arena built by the topology
/// mapper: a device's terminals occupy a contiguous range in device order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalId(pub(crate) u32);

impl TerminalId {
    /// Get the arena index of this terminal.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
