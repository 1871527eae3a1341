use crate::error::InternalError;

/// Bounded byte container with its length and capacity tracked together
///
/// Writes never go past the current limit. A tail can be reserved so that payload
/// writes leave room for the trailing CRC, which is then appended after [`release`].
///
/// [`release`]: FrameBuffer::release
pub(crate) struct FrameBuffer {
    buffer: Vec<u8>,
    len: usize,
    limit: usize,
}

impl FrameBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        FrameBuffer {
            buffer: vec![0; capacity],
            len: 0,
            limit: capacity,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn remaining(&self) -> usize {
        self.limit - self.len
    }

    /// reset the length to zero, keeping any reservation
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    /// shrink the length, a no-op if `len` is not smaller than the current length
    pub(crate) fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// keep the last `count` bytes of capacity out of reach of subsequent writes
    pub(crate) fn reserve_tail(&mut self, count: usize) {
        self.limit = self.capacity().saturating_sub(count).max(self.len);
    }

    /// make the whole capacity writable again
    pub(crate) fn release(&mut self) {
        self.limit = self.capacity();
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    pub(crate) fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// overwrite a byte that has already been written
    pub(crate) fn set(&mut self, index: usize, value: u8) -> Result<(), InternalError> {
        match self.buffer[..self.len].get_mut(index) {
            Some(x) => {
                *x = value;
                Ok(())
            }
            None => Err(InternalError::InsufficientWriteSpace(1, 0)),
        }
    }

    pub(crate) fn push(&mut self, value: u8) -> Result<(), InternalError> {
        if self.remaining() == 0 {
            return Err(InternalError::InsufficientWriteSpace(1, 0));
        }
        self.buffer[self.len] = value;
        self.len += 1;
        Ok(())
    }

    /// append all of `bytes` or nothing
    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), InternalError> {
        if self.remaining() < bytes.len() {
            // don't write any bytes if there's isn't space for the whole thing
            return Err(InternalError::InsufficientWriteSpace(
                bytes.len(),
                self.remaining(),
            ));
        }
        let end = self.len + bytes.len();
        self.buffer[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    pub(crate) fn push_u16_be(&mut self, value: u16) -> Result<(), InternalError> {
        self.extend_from_slice(&value.to_be_bytes())
    }

    pub(crate) fn push_u16_le(&mut self, value: u16) -> Result<(), InternalError> {
        self.extend_from_slice(&value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_when_writing_past_capacity() {
        let mut buffer = FrameBuffer::new(3);
        buffer.push(0x01).unwrap();
        buffer.push_u16_be(0x0203).unwrap();
        assert_eq!(
            buffer.push(0x04),
            Err(InternalError::InsufficientWriteSpace(1, 0))
        );
        assert_eq!(buffer.as_slice(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn partial_writes_are_rejected_whole() {
        let mut buffer = FrameBuffer::new(4);
        buffer.extend_from_slice(&[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(
            buffer.push_u16_le(0x1234),
            Err(InternalError::InsufficientWriteSpace(2, 1))
        );
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn reserved_tail_is_only_writable_after_release() {
        let mut buffer = FrameBuffer::new(6);
        buffer.reserve_tail(2);
        buffer.extend_from_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.remaining(), 0);
        assert!(buffer.push(5).is_err());

        buffer.release();
        buffer.push_u16_le(0x0605).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn truncate_and_set_only_touch_written_bytes() {
        let mut buffer = FrameBuffer::new(8);
        buffer.extend_from_slice(&[1, 2, 3, 4]).unwrap();
        buffer.truncate(2);
        buffer.truncate(6);
        assert_eq!(buffer.as_slice(), &[1, 2]);

        buffer.set(1, 0x82).unwrap();
        assert_eq!(buffer.get(1), Some(0x82));
        assert!(buffer.set(2, 0xFF).is_err());
        assert_eq!(buffer.get(2), None);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 8);
    }
}
