/// Exception codes defined in the Modbus specification
///
/// These are the only errors that ever travel on the wire. They are returned by the
/// application callbacks or chosen by the dispatcher, and encoded as a 3-byte error frame.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionCode {
    /// The function code received in the query is not an allowable action for the device
    IllegalFunction,
    /// The data address received in the query is not an allowable address for the device
    ///
    /// This includes the combination of start address and count being invalid
    IllegalDataAddress,
    /// A value contained in the query data field is not an allowable value for the device
    IllegalDataValue,
    /// An unrecoverable error occurred while the device was attempting to perform the requested
    /// action
    DeviceFailure,
    /// The device has accepted the request but is not ready to answer, the master should
    /// repeat the request later
    Acknowledge,
    /// The device is engaged in processing a long-duration command, try again later
    Busy,
    /// The device rejected the request
    NegativeAcknowledge,
    /// An exception code not defined in the standard
    Unknown(u8),
}

impl From<u8> for ExceptionCode {
    fn from(value: u8) -> Self {
        match value {
            crate::constants::exceptions::ILLEGAL_FUNCTION => ExceptionCode::IllegalFunction,
            crate::constants::exceptions::ILLEGAL_DATA_ADDRESS => ExceptionCode::IllegalDataAddress,
            crate::constants::exceptions::ILLEGAL_DATA_VALUE => ExceptionCode::IllegalDataValue,
            crate::constants::exceptions::DEVICE_FAILURE => ExceptionCode::DeviceFailure,
            crate::constants::exceptions::ACKNOWLEDGE => ExceptionCode::Acknowledge,
            crate::constants::exceptions::BUSY => ExceptionCode::Busy,
            crate::constants::exceptions::NEGATIVE_ACKNOWLEDGE => {
                ExceptionCode::NegativeAcknowledge
            }
            _ => ExceptionCode::Unknown(value),
        }
    }
}

impl From<ExceptionCode> for u8 {
    fn from(ex: ExceptionCode) -> Self {
        match ex {
            ExceptionCode::IllegalFunction => crate::constants::exceptions::ILLEGAL_FUNCTION,
            ExceptionCode::IllegalDataAddress => crate::constants::exceptions::ILLEGAL_DATA_ADDRESS,
            ExceptionCode::IllegalDataValue => crate::constants::exceptions::ILLEGAL_DATA_VALUE,
            ExceptionCode::DeviceFailure => crate::constants::exceptions::DEVICE_FAILURE,
            ExceptionCode::Acknowledge => crate::constants::exceptions::ACKNOWLEDGE,
            ExceptionCode::Busy => crate::constants::exceptions::BUSY,
            ExceptionCode::NegativeAcknowledge => {
                crate::constants::exceptions::NEGATIVE_ACKNOWLEDGE
            }
            ExceptionCode::Unknown(value) => value,
        }
    }
}

impl std::error::Error for ExceptionCode {}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            ExceptionCode::IllegalFunction => f.write_str("function code received in the query is not an allowable action for the device"),
            ExceptionCode::IllegalDataAddress => f.write_str("data address received in the query is not an allowable address for the device"),
            ExceptionCode::IllegalDataValue => f.write_str("value contained in the query is not an allowable value for the device"),
            ExceptionCode::DeviceFailure => f.write_str("unrecoverable error occurred while the device was attempting to perform the requested action"),
            ExceptionCode::Acknowledge => f.write_str("device has accepted the request but is not ready to answer, repeat later"),
            ExceptionCode::Busy => f.write_str("device is busy, try again later"),
            ExceptionCode::NegativeAcknowledge => f.write_str("device rejected the request"),
            ExceptionCode::Unknown(code) => write!(f, "unknown exception code: {code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes_map_to_their_wire_values() {
        let codes = [
            (ExceptionCode::IllegalFunction, 0x01),
            (ExceptionCode::IllegalDataAddress, 0x02),
            (ExceptionCode::IllegalDataValue, 0x03),
            (ExceptionCode::DeviceFailure, 0x04),
            (ExceptionCode::Acknowledge, 0x05),
            (ExceptionCode::Busy, 0x06),
            (ExceptionCode::NegativeAcknowledge, 0x07),
        ];

        for (code, value) in codes {
            assert_eq!(u8::from(code), value);
            assert_eq!(ExceptionCode::from(value), code);
        }
    }

    #[test]
    fn undefined_codes_are_preserved() {
        assert_eq!(ExceptionCode::from(0x0B), ExceptionCode::Unknown(0x0B));
        assert_eq!(u8::from(ExceptionCode::Unknown(0x0B)), 0x0B);
    }
}
