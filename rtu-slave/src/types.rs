use crate::constants;

/// Modbus device address, just a type-safe wrapper around `u8`
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId {
    /// underlying raw value
    pub value: u8,
}

/// Start and count tuple carried by every register access request
///
/// The count is passed through exactly as received. For single writes it
/// holds the raw value field of the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressRange {
    /// Starting address of the range
    pub start: u16,
    /// Count of elements in the range
    pub count: u16,
}

impl UnitId {
    /// create a new UnitId
    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    /// the broadcast address, requests sent to it are never answered
    pub const fn broadcast() -> Self {
        Self::new(constants::address::BROADCAST)
    }

    /// true if this is the broadcast address
    pub const fn is_broadcast(self) -> bool {
        self.value == constants::address::BROADCAST
    }
}

impl From<u8> for UnitId {
    fn from(value: u8) -> Self {
        UnitId::new(value)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04X}", self.value)
    }
}

impl AddressRange {
    /// Create a new address range
    pub const fn new(start: u16, count: u16) -> Self {
        AddressRange { start, count }
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "start: {:#06X} qty: {}", self.start, self.count)
    }
}
