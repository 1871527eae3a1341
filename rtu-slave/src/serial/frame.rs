use crate::common::buffer::FrameBuffer;
use crate::common::crc16::CRC_INITIAL;
use crate::config::CrcStrategy;
use crate::decode::FrameDecodeLevel;
use crate::error::InternalError;
use crate::types::UnitId;

/// Accumulates received bytes into a frame while maintaining a running CRC
///
/// It has no notion of a complete frame, the transport decides when the inter-frame
/// silence has elapsed and asks the operation to process what has been received.
pub(crate) struct FrameAccumulator {
    buffer: FrameBuffer,
    crc: u16,
    strategy: CrcStrategy,
}

impl FrameAccumulator {
    pub(crate) fn new(capacity: usize, strategy: CrcStrategy) -> Self {
        Self {
            buffer: FrameBuffer::new(capacity),
            crc: CRC_INITIAL,
            strategy,
        }
    }

    pub(crate) fn set_strategy(&mut self, strategy: CrcStrategy) {
        self.strategy = strategy;
    }

    /// append a byte, discarding the partial frame if the buffer fills up
    pub(crate) fn ingest(&mut self, byte: u8) -> Result<(), InternalError> {
        if self.buffer.is_empty() {
            self.crc = CRC_INITIAL;
        }

        self.buffer.push(byte)?;
        self.crc = self.strategy.add(byte, self.crc);

        if self.buffer.len() >= self.buffer.capacity() {
            let capacity = self.buffer.capacity();
            self.buffer.clear();
            tracing::warn!(
                "receive buffer overflow ({} bytes), discarding partial frame",
                capacity
            );
            return Err(InternalError::ReceiveOverflow(capacity));
        }

        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    /// the bytes received since the last reset
    pub(crate) fn frame(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// CRC over every received byte, zero for a correctly terminated frame
    pub(crate) fn residual(&self) -> u16 {
        self.crc
    }

    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
    }
}

pub(crate) struct RtuDisplay<'a> {
    level: FrameDecodeLevel,
    address: UnitId,
    frame: &'a [u8],
    crc: u16,
}

impl<'a> RtuDisplay<'a> {
    /// `frame` is the whole frame including its trailing CRC
    pub(crate) fn new(level: FrameDecodeLevel, frame: &'a [u8]) -> Self {
        let address = UnitId::new(frame.first().copied().unwrap_or_default());
        let crc = match frame {
            [.., low, high] => u16::from_le_bytes([*low, *high]),
            _ => 0,
        };
        RtuDisplay {
            level,
            address,
            frame,
            crc,
        }
    }
}

impl std::fmt::Display for RtuDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "address: {} crc: {:#06X} (frame len = {})",
            self.address,
            self.crc,
            self.frame.len(),
        )?;
        if self.level.payload_enabled() {
            crate::common::format::format_bytes(f, self.frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_ID: u8 = 0x2A;

    const READ_COILS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x01,    // function code
        0x00, 0x10, // starting address
        0x00, 0x13, // qty of outputs
        0x7A, 0x19, // crc
    ];

    const WRITE_MULTIPLE_REGISTERS_REQUEST: &[u8] = &[
        UNIT_ID, // unit id
        0x10,    // function code
        0x00, 0x10, // starting address
        0x00, 0x02, // qty of outputs
        0x04, // byte count
        0x12, 0x34, 0x56, 0x78, // output values
        0x07, 0x73, // crc
    ];

    fn accumulate(accumulator: &mut FrameAccumulator, frame: &[u8]) {
        for byte in frame {
            accumulator.ingest(*byte).unwrap();
        }
    }

    #[test]
    fn residual_is_zero_for_valid_frames() {
        for strategy in [CrcStrategy::Table, CrcStrategy::Bitwise] {
            for frame in [READ_COILS_REQUEST, WRITE_MULTIPLE_REGISTERS_REQUEST] {
                let mut accumulator = FrameAccumulator::new(64, strategy);
                accumulate(&mut accumulator, frame);
                assert_eq!(accumulator.len(), frame.len());
                assert_eq!(accumulator.frame(), frame);
                assert_eq!(accumulator.residual(), 0);
            }
        }
    }

    #[test]
    fn residual_is_nonzero_for_wrong_crc() {
        let mut accumulator = FrameAccumulator::new(64, CrcStrategy::Table);
        accumulate(&mut accumulator, &READ_COILS_REQUEST[..6]);
        accumulate(&mut accumulator, &[0xFF, 0xFF]);
        assert_ne!(accumulator.residual(), 0);
    }

    #[test]
    fn crc_is_reseeded_on_first_byte_after_reset() {
        let mut accumulator = FrameAccumulator::new(64, CrcStrategy::Table);
        accumulate(&mut accumulator, &[0xDE, 0xAD, 0xBE, 0xEF]);
        accumulator.reset();
        assert_eq!(accumulator.len(), 0);

        accumulate(&mut accumulator, READ_COILS_REQUEST);
        assert_eq!(accumulator.residual(), 0);
    }

    #[test]
    fn overflow_discards_partial_frame() {
        let mut accumulator = FrameAccumulator::new(16, CrcStrategy::Table);
        for byte in 0..15u8 {
            accumulator.ingest(byte).unwrap();
        }
        assert_eq!(
            accumulator.ingest(0xFF),
            Err(InternalError::ReceiveOverflow(16))
        );
        assert_eq!(accumulator.len(), 0);

        // the next frame accumulates cleanly
        accumulate(&mut accumulator, READ_COILS_REQUEST);
        assert_eq!(accumulator.frame(), READ_COILS_REQUEST);
        assert_eq!(accumulator.residual(), 0);
    }

    #[test]
    fn display_shows_address_and_crc() {
        let text = RtuDisplay::new(FrameDecodeLevel::Header, READ_COILS_REQUEST).to_string();
        assert_eq!(text, "address: 0x2A crc: 0x197A (frame len = 8)");

        let text = RtuDisplay::new(FrameDecodeLevel::Payload, READ_COILS_REQUEST).to_string();
        assert!(text.ends_with("2A 01 00 10 00 13 7A 19"));
    }
}
