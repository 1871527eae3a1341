pub(crate) mod buffer;
pub(crate) mod crc16;
pub(crate) mod format;
pub(crate) mod function;
