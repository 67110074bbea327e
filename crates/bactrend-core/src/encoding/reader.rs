use crate::DecodeError;

/// Cursor over a received PDU. Copying a reader gives an independent
/// lookahead cursor over the same bytes.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    tail: &'a [u8],
    consumed: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self {
            tail: buf,
            consumed: 0,
        }
    }

    /// Octets consumed so far.
    pub const fn position(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_empty()
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.tail.first().copied().ok_or(DecodeError::UnexpectedEof)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.tail.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let (head, tail) = self.tail.split_at(len);
        self.tail = tail;
        self.consumed += len;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    pub fn read_be_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_be_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// The unread tail, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        self.tail
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::DecodeError;

    #[test]
    fn reads_npdu_style_fields() {
        // version, control, DNET, DLEN, DADR
        let mut r = Reader::new(&[0x01, 0x20, 0x00, 0x07, 0x01, 0x11, 0xFF]);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u8().unwrap(), 0x20);
        assert_eq!(r.read_be_u16().unwrap(), 7);
        let len = r.read_u8().unwrap() as usize;
        assert_eq!(r.read_exact(len).unwrap(), &[0x11]);
        assert_eq!(r.position(), 6);
        assert_eq!(r.rest(), &[0xFF]);
    }

    #[test]
    fn short_reads_fail_without_consuming() {
        let mut r = Reader::new(&[0x00, 0x00, 0x01]);
        assert_eq!(r.read_be_u32().unwrap_err(), DecodeError::UnexpectedEof);
        assert_eq!(r.remaining(), 3);
        assert_eq!(r.read_exact(3).unwrap(), &[0, 0, 1]);
        assert_eq!(r.peek_u8().unwrap_err(), DecodeError::UnexpectedEof);
        assert!(r.is_empty());
    }

    #[test]
    fn copies_are_lookahead() {
        let r = Reader::new(&[0xAB, 0xCD]);
        let mut peeked = r;
        assert_eq!(peeked.read_be_u16().unwrap(), 0xABCD);
        assert_eq!(r.peek_u8().unwrap(), 0xAB);
    }
}
