//! CRC-16/MODBUS: reflected polynomial 0xA001, initial value 0xFFFF, no final XOR
//!
//! The CRC of a correctly terminated frame, computed over the frame *including* its
//! trailing CRC field, is zero.

use crate::config::CrcStrategy;

/// Initial value of the running CRC
pub const CRC_INITIAL: u16 = 0xFFFF;

const POLYNOMIAL: u16 = 0xA001;

/// whole-buffer checksums in the table strategy
const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

/// precomputes the CRC table as a constant!
static TABLE: [u16; 256] = make_table();

const fn make_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut index = 0;
    while index < 256 {
        let mut crc = index as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x0001 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[index] = crc;
        index += 1;
    }
    table
}

fn add_table(byte: u8, crc: u16) -> u16 {
    (crc >> 8) ^ TABLE[((crc ^ byte as u16) & 0x00FF) as usize]
}

fn add_bitwise(byte: u8, mut crc: u16) -> u16 {
    crc ^= byte as u16;
    for _ in 0..8 {
        let carry = crc & 0x0001 != 0;
        crc >>= 1;
        if carry {
            crc ^= POLYNOMIAL;
        }
    }
    crc
}

impl CrcStrategy {
    /// fold a single byte into a running CRC
    pub fn add(self, byte: u8, crc: u16) -> u16 {
        match self {
            CrcStrategy::Table => add_table(byte, crc),
            CrcStrategy::Bitwise => add_bitwise(byte, crc),
        }
    }

    /// CRC of a whole buffer starting from [`CRC_INITIAL`]
    pub fn checksum(self, bytes: &[u8]) -> u16 {
        match self {
            CrcStrategy::Table => CRC.checksum(bytes),
            CrcStrategy::Bitwise => bytes
                .iter()
                .fold(CRC_INITIAL, |crc, byte| add_bitwise(*byte, crc)),
        }
    }
}

/// Fold a single byte into a running CRC using the default strategy
pub fn crc16_add(byte: u8, crc: u16) -> u16 {
    CrcStrategy::default().add(byte, crc)
}

/// CRC of a whole buffer using the default strategy
pub fn crc16(bytes: &[u8]) -> u16 {
    CrcStrategy::default().checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATEGIES: [CrcStrategy; 2] = [CrcStrategy::Table, CrcStrategy::Bitwise];

    const READ_HOLDING_REGISTERS_REQUEST: &[u8] = &[
        0x01, // unit id
        0x03, // function code
        0x12, 0x34, // starting address
        0x00, 0x05, // qty of registers
        0xC1, 0x7F, // crc
    ];

    fn fold(strategy: CrcStrategy, bytes: &[u8]) -> u16 {
        bytes
            .iter()
            .fold(CRC_INITIAL, |crc, byte| strategy.add(*byte, crc))
    }

    #[test]
    fn computes_crc_of_known_frame() {
        let body = &READ_HOLDING_REGISTERS_REQUEST[..6];
        for strategy in STRATEGIES {
            assert_eq!(strategy.checksum(body), 0x7FC1);
            assert_eq!(fold(strategy, body), 0x7FC1);
        }
    }

    #[test]
    fn residual_of_terminated_frame_is_zero() {
        for strategy in STRATEGIES {
            assert_eq!(strategy.checksum(READ_HOLDING_REGISTERS_REQUEST), 0);
            assert_eq!(fold(strategy, READ_HOLDING_REGISTERS_REQUEST), 0);
        }
    }

    #[test]
    fn empty_buffer_yields_initial_value() {
        for strategy in STRATEGIES {
            assert_eq!(strategy.checksum(&[]), CRC_INITIAL);
        }
    }

    #[test]
    fn strategies_agree_on_every_byte_and_state() {
        for state in [0x0000, 0xFFFF, 0x1234, 0xA001, 0x8000, 0x00FF] {
            for byte in 0..=255u8 {
                assert_eq!(
                    CrcStrategy::Table.add(byte, state),
                    CrcStrategy::Bitwise.add(byte, state)
                );
            }
        }
    }

    #[test]
    fn table_matches_crc_crate_for_long_buffers() {
        let data: Vec<u8> = (0..=255u8).cycle().take(600).collect();
        assert_eq!(fold(CrcStrategy::Table, &data), CRC.checksum(&data));
        assert_eq!(CrcStrategy::Bitwise.checksum(&data), CRC.checksum(&data));
    }

    #[test]
    fn free_functions_use_default_strategy() {
        assert_eq!(crc16(&READ_HOLDING_REGISTERS_REQUEST[..6]), 0x7FC1);
        assert_eq!(crc16_add(0x01, CRC_INITIAL), CrcStrategy::Bitwise.add(0x01, CRC_INITIAL));
    }
}
