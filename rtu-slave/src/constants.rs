/// Lengths and offsets of the RTU frame layout
pub mod frame {
    /// Length of the device address field
    pub const ADDRESS_LENGTH: usize = 1;
    /// Length of the function code field
    pub const FUNCTION_CODE_LENGTH: usize = 1;
    /// Length of the trailing CRC
    pub const CRC_LENGTH: usize = 2;
    /// Length of the device address + function code header
    pub const HEADER_LENGTH: usize = ADDRESS_LENGTH + FUNCTION_CODE_LENGTH;
    /// Frames shorter than this are discarded without a response
    pub const MIN_FRAME_LENGTH: usize = 7;
    /// Smallest receive or transmit buffer an operation accepts
    pub const MIN_BUFFER_SIZE: usize = 16;
    /// Length of an error response without its CRC
    pub const ERROR_RESPONSE_LENGTH: usize = HEADER_LENGTH + 1;
    /// Bit set in the function code of an error response
    pub const ERROR_FLAG: u8 = 0x80;
}

/// Device addressing
pub mod address {
    /// Address of a broadcast request
    pub const BROADCAST: u8 = 0x00;
}

/// Diagnostic sub-functions
pub mod diagnostics {
    /// Return query data (echo / loopback)
    pub const RETURN_QUERY_DATA: u16 = 0x0000;
    /// Default first sub-function of the statistics range
    pub const DEFAULT_STATISTICS_BASE: u16 = 0xAA00;
    /// Number of sub-functions reserved for statistics
    pub const STATISTICS_COUNT: u16 = 5;
}

/// Exception codes
pub mod exceptions {
    /// Illegal function
    pub const ILLEGAL_FUNCTION: u8 = 0x01;
    /// Illegal data address
    pub const ILLEGAL_DATA_ADDRESS: u8 = 0x02;
    /// Illegal data value
    pub const ILLEGAL_DATA_VALUE: u8 = 0x03;
    /// Device failure
    pub const DEVICE_FAILURE: u8 = 0x04;
    /// Acknowledge
    pub const ACKNOWLEDGE: u8 = 0x05;
    /// Device busy
    pub const BUSY: u8 = 0x06;
    /// Negative acknowledge
    pub const NEGATIVE_ACKNOWLEDGE: u8 = 0x07;
}
