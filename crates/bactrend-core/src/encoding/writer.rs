use crate::EncodeError;

/// Appends octets to a fixed output buffer. Nothing is written by a call
/// that fails, so a caller can try an item and fall back to `rewind`.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub const fn position(&self) -> usize {
        self.len
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    pub fn as_written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Truncates the output back to `pos`. Positions past the end are ignored.
    pub fn rewind(&mut self, pos: usize) {
        if pos < self.len {
            self.len = pos;
        }
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8], EncodeError> {
        let end = self
            .len
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(EncodeError::BufferTooSmall)?;
        let start = self.len;
        self.len = end;
        Ok(&mut self.buf[start..end])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn write_be_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.write_all(&value.to_be_bytes())
    }

    pub fn write_be_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.write_all(&value.to_be_bytes())
    }
}
