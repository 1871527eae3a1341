use crate::types::UnitId;

/// Errors reported to the caller of the engine. None of these are ever sent on the wire.
///
/// The frame-level variants mean "nothing was transmitted". The master is expected
/// to time out and retry, the engine never retries on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    /// The operation is not attached to a device context
    #[error("operation is not attached to a device context")]
    NoContext,
    /// The received frame is shorter than the minimum frame length
    #[error("invalid packet: received {0} bytes, minimum frame length is 7")]
    InvalidPacket(usize),
    /// The CRC accumulated over the whole frame is not zero
    #[error("CRC mismatch: residual {residual:#06X}")]
    Crc {
        /// CRC of the whole frame including its trailing CRC field
        residual: u16,
    },
    /// The frame was addressed to another device
    #[error("frame addressed to another device: {0}")]
    AddressNotMatch(UnitId),
    /// A broadcast frame used a function that does not accept broadcast
    #[error("broadcast is not supported for function code {0:#04X}")]
    BroadcastNotSupported(u8),
    /// The receive buffer filled up before the frame was complete. The partial frame is discarded.
    #[error("receive buffer overflow at {0} bytes, partial frame discarded")]
    ReceiveOverflow(usize),
    /// There are no more response bytes to transmit
    #[error("no more response bytes to transmit")]
    MessageEnded,
    /// Attempted to write more bytes than the buffer allows
    #[error("attempted to write {0} bytes with {1} bytes remaining")]
    InsufficientWriteSpace(usize, usize),
}

impl InternalError {
    /// Structural errors indicate misuse of the engine rather than a bad frame
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InternalError::NoContext | InternalError::InsufficientWriteSpace(_, _)
        )
    }
}
