//! # RLPn Writer
//!
//! Streaming encoder. Lists are opened with [`Writer::begin_list`] and closed
//! with [`Writer::end_list`]; the header is inserted once the payload length
//! is known.

/// Marker written for a null value (long-form list header of length zero).
pub const NULL_MARKER: [u8; 2] = [0xf8, 0x00];

const SHORT_STRING: u8 = 0x80;
const LONG_STRING: u8 = 0xb7;
const SHORT_LIST: u8 = 0xc0;
const LONG_LIST: u8 = 0xf7;

/// Canonical RLPn encoder.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
    open_lists: Vec<usize>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a byte string.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        if bytes.len() == 1 && bytes[0] < SHORT_STRING {
            self.buf.push(bytes[0]);
        } else {
            let header = length_header(SHORT_STRING, LONG_STRING, bytes.len());
            self.buf.extend_from_slice(&header);
            self.buf.extend_from_slice(bytes);
        }
        self
    }

    /// Write a non-negative integer as minimal two's-complement bytes.
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        let bytes = integer_bytes(value);
        self.write_bytes(&bytes)
    }

    /// Write the null marker.
    pub fn write_null(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&NULL_MARKER);
        self
    }

    /// Write bytes that are already a complete encoded item.
    pub fn write_raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    /// Open a nested list.
    pub fn begin_list(&mut self) -> &mut Self {
        self.open_lists.push(self.buf.len());
        self
    }

    /// Close the innermost open list.
    ///
    /// # Panics
    ///
    /// Panics if no list is open; that is a programming error in an
    /// `Encodable` implementation, never a property of input data.
    pub fn end_list(&mut self) -> &mut Self {
        let start = self
            .open_lists
            .pop()
            .expect("end_list called without matching begin_list");
        let header = length_header(SHORT_LIST, LONG_LIST, self.buf.len() - start);
        self.buf.splice(start..start, header);
        self
    }

    /// Finish encoding and return the bytes.
    ///
    /// # Panics
    ///
    /// Panics if a list is still open.
    pub fn into_bytes(self) -> Vec<u8> {
        assert!(
            self.open_lists.is_empty(),
            "{} list(s) left open",
            self.open_lists.len()
        );
        self.buf
    }
}

/// Minimal big-endian two's-complement bytes of a non-negative integer.
///
/// `0` encodes as a single zero byte, and a leading zero byte is kept when the
/// top bit would otherwise read as a sign.
pub fn integer_bytes(value: u64) -> Vec<u8> {
    let be = value.to_be_bytes();
    let first = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
    let mut out = Vec::with_capacity(be.len() - first + 1);
    if be[first] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&be[first..]);
    out
}

fn length_header(short_base: u8, long_base: u8, len: usize) -> Vec<u8> {
    if len <= 55 {
        return vec![short_base + len as u8];
    }
    let be = (len as u64).to_be_bytes();
    let first = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
    let mut header = Vec::with_capacity(1 + be.len() - first);
    header.push(long_base + (be.len() - first) as u8);
    header.extend_from_slice(&be[first..]);
    header
}
