use crate::constants;
use crate::decode::DecodeLevel;
use crate::error::InternalError;

/// How the CRC is computed
///
/// Both strategies produce identical output, the choice only trades memory for speed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum CrcStrategy {
    /// 256-entry lookup table computed at compile time
    #[default]
    Table,
    /// shift and XOR, 8 iterations per byte
    Bitwise,
}

/// Whether the device keeps statistics counters, and where they are exposed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum StatisticsConfig {
    /// No counters are kept, the statistics sub-functions are routed to the diagnostic callback
    Disabled,
    /// Counters are kept and readable through diagnostic sub-functions
    /// `base_address..base_address + 5`
    Enabled {
        /// first diagnostic sub-function of the statistics range
        base_address: u16,
    },
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        StatisticsConfig::Enabled {
            base_address: constants::diagnostics::DEFAULT_STATISTICS_BASE,
        }
    }
}

/// Configuration of a device context
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// CRC computation used for incoming frames and outgoing responses
    pub crc: CrcStrategy,
    /// statistics counters
    pub statistics: StatisticsConfig,
    /// protocol decoding written to the log
    pub decode: DecodeLevel,
}

impl DeviceConfig {
    /// Change the CRC strategy
    pub fn crc(mut self, crc: CrcStrategy) -> Self {
        self.crc = crc;
        self
    }

    /// Change the statistics configuration
    pub fn statistics(mut self, statistics: StatisticsConfig) -> Self {
        self.statistics = statistics;
        self
    }

    /// Change the decode level
    pub fn decode(mut self, decode: DecodeLevel) -> Self {
        self.decode = decode;
        self
    }
}

/// Sizes of the receive and transmit buffers of an operation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferConfig {
    /// capacity of the receive buffer, a frame of this length is treated as an overflow
    pub rx_capacity: usize,
    /// capacity of the transmit buffer, including the trailing CRC
    pub tx_capacity: usize,
}

impl BufferConfig {
    /// Largest RTU frame
    pub const MAX_FRAME_SIZE: usize = 256;

    /// Create a buffer configuration
    pub fn new(rx_capacity: usize, tx_capacity: usize) -> Self {
        Self {
            rx_capacity,
            tx_capacity,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), InternalError> {
        for capacity in [self.rx_capacity, self.tx_capacity] {
            if capacity < constants::frame::MIN_BUFFER_SIZE {
                return Err(InternalError::InsufficientWriteSpace(
                    constants::frame::MIN_BUFFER_SIZE,
                    capacity,
                ));
            }
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new(Self::MAX_FRAME_SIZE, Self::MAX_FRAME_SIZE)
    }
}
