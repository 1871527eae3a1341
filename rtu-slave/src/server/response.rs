use crate::common::buffer::FrameBuffer;
use crate::common::function::FunctionCode;
use crate::config::CrcStrategy;
use crate::constants::frame::{
    ADDRESS_LENGTH, CRC_LENGTH, ERROR_FLAG, ERROR_RESPONSE_LENGTH, HEADER_LENGTH,
};
use crate::decode::AppDecodeLevel;
use crate::error::InternalError;
use crate::exception::ExceptionCode;
use crate::types::UnitId;

/// Builds a response frame in the transmit buffer
///
/// The last [`CRC_LENGTH`] bytes of capacity stay reserved while the body is written so
/// that any body that fits is guaranteed to leave room for the checksum.
pub(crate) struct ResponseWriter {
    buffer: FrameBuffer,
}

impl ResponseWriter {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buffer: FrameBuffer::new(capacity),
        }
    }

    /// start a new response with the device address and the request's function byte
    pub(crate) fn begin(&mut self, address: UnitId, function: u8) -> Result<(), InternalError> {
        self.buffer.clear();
        self.buffer.release();
        self.buffer.reserve_tail(CRC_LENGTH);
        self.buffer.push(address.value)?;
        self.buffer.push(function)
    }

    /// bytes that can still be written to the body
    pub(crate) fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    pub(crate) fn push_u8(&mut self, value: u8) -> Result<(), InternalError> {
        self.buffer.push(value)
    }

    pub(crate) fn push_u16(&mut self, value: u16) -> Result<(), InternalError> {
        self.buffer.push_u16_be(value)
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) -> Result<(), InternalError> {
        self.buffer.extend_from_slice(bytes)
    }

    /// replace whatever body has been written with an exception body
    pub(crate) fn write_exception(&mut self, code: ExceptionCode) -> Result<(), InternalError> {
        let function = self
            .buffer
            .get(ADDRESS_LENGTH)
            .ok_or(InternalError::InsufficientWriteSpace(
                ERROR_RESPONSE_LENGTH,
                self.buffer.len(),
            ))?;
        self.buffer.truncate(HEADER_LENGTH);
        self.buffer.set(ADDRESS_LENGTH, function | ERROR_FLAG)?;
        self.buffer.push(code.into())
    }

    /// append the CRC over everything written so far
    pub(crate) fn finish(&mut self, strategy: CrcStrategy) -> Result<(), InternalError> {
        self.buffer.release();
        let crc = strategy.checksum(self.buffer.as_slice());
        self.buffer.push_u16_le(crc)
    }

    /// drop the response, nothing will be transmitted
    pub(crate) fn discard(&mut self) {
        self.buffer.clear();
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

/// Describes a response body (no address or CRC) for `PDU TX` logging
pub(crate) struct ResponseDisplay<'a> {
    level: AppDecodeLevel,
    body: &'a [u8],
}

impl<'a> ResponseDisplay<'a> {
    /// `body` starts at the function byte and excludes the CRC
    pub(crate) fn new(level: AppDecodeLevel, body: &'a [u8]) -> Self {
        Self { level, body }
    }
}

impl std::fmt::Display for ResponseDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (function, data) = match self.body.split_first() {
            Some((function, data)) => (*function, data),
            None => return Ok(()),
        };

        if function & ERROR_FLAG != 0 {
            let code = data.first().copied().map(ExceptionCode::from);
            match (FunctionCode::get(function & !ERROR_FLAG), code) {
                (Some(x), Some(code)) => write!(f, "{x} exception: {code}"),
                (None, Some(code)) => write!(
                    f,
                    "UNKNOWN ({:#04X}) exception: {code}",
                    function & !ERROR_FLAG
                ),
                (_, None) => write!(f, "malformed exception ({:#04X})", function),
            }
        } else {
            match FunctionCode::get(function) {
                Some(x) => write!(f, "{x}")?,
                None => write!(f, "UNKNOWN ({function:#04X})")?,
            }
            if self.level.data_headers() {
                write!(f, " (len = {})", data.len())?;
            }
            if self.level.data_values() {
                crate::common::format::format_bytes(f, data)?;
            }
            Ok(())
        }
    }
}
