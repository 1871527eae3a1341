//! A byte-oriented [Modbus](http://modbus.org/) RTU slave engine for serial links.
//!
//! The engine owns no I/O and never blocks. The transport feeds it one received byte at a
//! time, tells it when the inter-frame silence has elapsed, and drains the response one
//! byte at a time. This makes it usable from an interrupt handler, a polling loop or an
//! async task alike.
//!
//! # Features
//!
//! * Running CRC-16 computed as bytes arrive, table or bitwise
//! * Application data is supplied by callbacks, the engine keeps no register storage
//! * Broadcast write multiple registers
//! * Optional statistics counters readable through diagnostic sub-functions
//! * Protocol decoding through [tracing](https://docs.rs/tracing)
//!
//! # Supported Functions
//!
//! * Read Coils
//! * Read Discrete Inputs
//! * Read Holding Registers
//! * Read Input Registers
//! * Write Single Coil
//! * Write Single Register
//! * Diagnostics
//! * Write Multiple Coils
//! * Write Multiple Registers
//!
//! # Example
//!
//! ```
//! use rtu_slave::*;
//!
//! struct Registers([u8; 4]);
//!
//! impl ReadHandler for Registers {
//!     fn read(&mut self, range: AddressRange) -> Result<Option<&[u8]>, ExceptionCode> {
//!         let begin = 2 * range.start as usize;
//!         let end = begin + 2 * range.count as usize;
//!         self.0.get(begin..end).map(Some).ok_or(ExceptionCode::IllegalDataAddress)
//!     }
//! }
//!
//! let mut device = DeviceContext::new(UnitId::new(1), DeviceConfig::default())
//!     .with_read_holding_registers(Registers([0x00, 0x01, 0x00, 0x02]));
//!
//! let mut operation = Operation::with_context(&mut device, BufferConfig::default()).unwrap();
//!
//! // read holding register 0
//! for byte in [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A] {
//!     operation.ingest(byte).unwrap();
//! }
//!
//! assert_eq!(operation.process(), Ok(Outcome::Success));
//!
//! let mut response = Vec::new();
//! while let Ok(byte) = operation.next_output_byte() {
//!     response.push(byte);
//! }
//! assert_eq!(response, [0x01, 0x03, 0x02, 0x00, 0x01, 0x79, 0x84]);
//! ```

// ------  api modules --------
/// Protocol constants: frame layout, addresses, diagnostic sub-functions and exception codes
pub mod constants;

mod config;
mod decode;
mod error;
mod exception;
mod types;

pub use crate::common::crc16::*;
pub use crate::config::*;
pub use crate::decode::*;
pub use crate::error::*;
pub use crate::exception::*;
pub use crate::server::*;
pub use crate::types::*;

// internal modules
mod common;
mod serial {
    pub(crate) mod frame;
}
mod server;
