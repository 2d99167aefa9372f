use std::io::{Cursor, Error as IoError, ErrorKind, Result as IoResult};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

/// Growable byte buffer with a read cursor.
///
/// Reads are bounds-checked and fail with `UnexpectedEof`; writes append at
/// the end regardless of the cursor.
pub struct ByteBuffer {
    inner: Cursor<Vec<u8>>,
}

impl ByteBuffer {
    /// Wrap existing bytes for reading
    pub fn new(data: Vec<u8>) -> Self {
        ByteBuffer { inner: Cursor::new(data) }
    }

    /// Create an empty buffer for writing
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer::new(Vec::with_capacity(capacity))
    }

    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.inner.get_ref().len().saturating_sub(self.position())
    }

    /// Check if buffer has at least n bytes remaining
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    fn ensure(&self, n: usize) -> IoResult<()> {
        if self.has_remaining(n) {
            Ok(())
        } else {
            Err(IoError::new(
                ErrorKind::UnexpectedEof,
                format!("need {} bytes, {} remaining", n, self.remaining()),
            ))
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> IoResult<Vec<u8>> {
        self.ensure(len)?;
        let start = self.position();
        let bytes = self.inner.get_ref()[start..start + len].to_vec();
        self.inner.set_position((start + len) as u64);
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> IoResult<()> {
        self.ensure(len)?;
        self.inner.set_position((self.position() + len) as u64);
        Ok(())
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        self.inner.read_u8()
    }

    pub fn read_u16_be(&mut self) -> IoResult<u16> {
        self.inner.read_u16::<BigEndian>()
    }

    pub fn read_i16_be(&mut self) -> IoResult<i16> {
        self.inner.read_i16::<BigEndian>()
    }

    pub fn read_u24_be(&mut self) -> IoResult<u32> {
        self.inner.read_u24::<BigEndian>()
    }

    pub fn read_u32_be(&mut self) -> IoResult<u32> {
        self.inner.read_u32::<BigEndian>()
    }

    pub fn read_u32_le(&mut self) -> IoResult<u32> {
        self.inner.read_u32::<LittleEndian>()
    }

    pub fn read_f64_be(&mut self) -> IoResult<f64> {
        self.inner.read_f64::<BigEndian>()
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> IoResult<()> {
        self.inner.get_mut().extend_from_slice(data);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> IoResult<()> {
        self.inner.get_mut().write_u8(value)
    }

    pub fn write_u16_be(&mut self, value: u16) -> IoResult<()> {
        self.inner.get_mut().write_u16::<BigEndian>(value)
    }

    pub fn write_i16_be(&mut self, value: i16) -> IoResult<()> {
        self.inner.get_mut().write_i16::<BigEndian>(value)
    }

    pub fn write_u24_be(&mut self, value: u32) -> IoResult<()> {
        self.inner.get_mut().write_u24::<BigEndian>(value & 0x00FF_FFFF)
    }

    pub fn write_u32_be(&mut self, value: u32) -> IoResult<()> {
        self.inner.get_mut().write_u32::<BigEndian>(value)
    }

    pub fn write_u32_le(&mut self, value: u32) -> IoResult<()> {
        self.inner.get_mut().write_u32::<LittleEndian>(value)
    }

    pub fn write_f64_be(&mut self, value: f64) -> IoResult<()> {
        self.inner.get_mut().write_f64::<BigEndian>(value)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.inner.into_inner()
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }
}
