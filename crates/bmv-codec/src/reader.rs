//! # RLPn Reader
//!
//! Strict, zero-copy decoder. Every item is validated against its canonical
//! form; a list reader must be [`finish`](Reader::finish)ed to prove that no
//! items were left behind.

use crate::errors::CodecError;

/// One decoded item header plus its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item<'a> {
    Bytes(&'a [u8]),
    List(&'a [u8]),
    Null,
}

/// Cursor over a sequence of encoded items.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a top-level encoding.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Whether unread items remain.
    pub fn has_next(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Whether the next item is the null marker.
    pub fn peek_null(&self) -> bool {
        self.data.get(self.pos) == Some(&0xf8) && self.data.get(self.pos + 1) == Some(&0x00)
    }

    /// Read a byte string.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        match self.next_item()? {
            Item::Bytes(bytes) => Ok(bytes),
            Item::List(_) => Err(CodecError::ExpectedBytes),
            Item::Null => Err(CodecError::UnexpectedNull),
        }
    }

    /// Read a byte string of exactly `N` bytes.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes()?;
        <[u8; N]>::try_from(bytes).map_err(|_| CodecError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        })
    }

    /// Read a byte string or the null marker.
    pub fn read_optional_bytes(&mut self) -> Result<Option<&'a [u8]>, CodecError> {
        if self.peek_null() {
            self.read_null()?;
            return Ok(None);
        }
        self.read_bytes().map(Some)
    }

    /// Consume the null marker.
    pub fn read_null(&mut self) -> Result<(), CodecError> {
        match self.next_item()? {
            Item::Null => Ok(()),
            Item::Bytes(_) => Err(CodecError::Invalid("expected null, found bytes".into())),
            Item::List(_) => Err(CodecError::Invalid("expected null, found list".into())),
        }
    }

    /// Read a non-negative integer.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.read_bytes()?;
        decode_integer(bytes)
    }

    /// Read a non-negative integer that must fit in 32 bits.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let value = self.read_u64()?;
        u32::try_from(value).map_err(|_| CodecError::InvalidInteger("exceeds 32 bits"))
    }

    /// Enter a list, returning a reader over its items.
    pub fn read_list(&mut self) -> Result<Reader<'a>, CodecError> {
        match self.next_item()? {
            Item::List(payload) => Ok(Reader::new(payload)),
            Item::Bytes(_) => Err(CodecError::ExpectedList),
            Item::Null => Err(CodecError::UnexpectedNull),
        }
    }

    /// Assert that every item has been consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        match self.data.len() - self.pos {
            0 => Ok(()),
            rest => Err(CodecError::TrailingBytes(rest)),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(CodecError::UnexpectedEof {
                needed: len,
                available,
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn long_length(&mut self, len_of_len: usize) -> Result<usize, CodecError> {
        let raw = self.take(len_of_len)?;
        if raw[0] == 0 {
            return Err(CodecError::NonCanonical("leading zero in length"));
        }
        let mut len: u64 = 0;
        for &b in raw {
            len = (len << 8) | u64::from(b);
        }
        if len < 56 {
            return Err(CodecError::NonCanonical("long form for short payload"));
        }
        usize::try_from(len).map_err(|_| CodecError::NonCanonical("length overflows usize"))
    }

    fn next_item(&mut self) -> Result<Item<'a>, CodecError> {
        let prefix = self.take(1)?[0];
        match prefix {
            0x00..=0x7f => Ok(Item::Bytes(&self.data[self.pos - 1..self.pos])),
            0x80..=0xb7 => {
                let payload = self.take(usize::from(prefix - 0x80))?;
                if payload.len() == 1 && payload[0] < 0x80 {
                    return Err(CodecError::NonCanonical("single byte wrapped in header"));
                }
                Ok(Item::Bytes(payload))
            }
            0xb8..=0xbf => {
                let len = self.long_length(usize::from(prefix - 0xb7))?;
                Ok(Item::Bytes(self.take(len)?))
            }
            0xc0..=0xf7 => Ok(Item::List(self.take(usize::from(prefix - 0xc0))?)),
            _ => {
                if prefix == 0xf8 && self.data.get(self.pos) == Some(&0x00) {
                    self.pos += 1;
                    return Ok(Item::Null);
                }
                let len = self.long_length(usize::from(prefix - 0xf7))?;
                Ok(Item::List(self.take(len)?))
            }
        }
    }
}

/// Decode minimal two's-complement bytes into a non-negative `u64`.
pub fn decode_integer(bytes: &[u8]) -> Result<u64, CodecError> {
    match bytes {
        [] => Err(CodecError::InvalidInteger("empty")),
        [first, ..] if first & 0x80 != 0 => Err(CodecError::InvalidInteger("negative")),
        [0, second, ..] if second & 0x80 == 0 => {
            Err(CodecError::InvalidInteger("redundant leading zero"))
        }
        _ => {
            let magnitude = if bytes[0] == 0 && bytes.len() > 1 {
                &bytes[1..]
            } else {
                bytes
            };
            if magnitude.len() > 8 {
                return Err(CodecError::InvalidInteger("exceeds 64 bits"));
            }
            Ok(magnitude
                .iter()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
        }
    }
}
