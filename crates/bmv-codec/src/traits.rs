//! # Encodable / Decodable
//!
//! Structure-level encoding hooks plus implementations for the primitive
//! field types used on the wire.

use crate::errors::CodecError;
use crate::reader::Reader;
use crate::writer::Writer;

/// A value with a canonical RLPn encoding.
pub trait Encodable {
    /// Append this value to `w`.
    fn encode(&self, w: &mut Writer);

    /// Encode this value as a standalone item.
    fn to_rlp(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode(&mut w);
        w.into_bytes()
    }
}

/// A value that can be strictly decoded from RLPn.
pub trait Decodable: Sized {
    /// Read one value from `r`.
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError>;

    /// Decode a standalone item, rejecting trailing bytes.
    fn from_rlp(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let value = Self::decode(&mut r)?;
        r.finish()?;
        Ok(value)
    }
}

impl Encodable for u64 {
    fn encode(&self, w: &mut Writer) {
        w.write_u64(*self);
    }
}

impl Decodable for u64 {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_u64()
    }
}

impl Encodable for u32 {
    fn encode(&self, w: &mut Writer) {
        w.write_u64(u64::from(*self));
    }
}

impl Decodable for u32 {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_u32()
    }
}

impl Encodable for [u8] {
    fn encode(&self, w: &mut Writer) {
        w.write_bytes(self);
    }
}

impl Encodable for Vec<u8> {
    fn encode(&self, w: &mut Writer) {
        w.write_bytes(self);
    }
}

impl Decodable for Vec<u8> {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_bytes().map(<[u8]>::to_vec)
    }
}

impl<const N: usize> Encodable for [u8; N] {
    fn encode(&self, w: &mut Writer) {
        w.write_bytes(self);
    }
}

impl<const N: usize> Decodable for [u8; N] {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_array::<N>()
    }
}

impl Encodable for String {
    fn encode(&self, w: &mut Writer) {
        w.write_bytes(self.as_bytes());
    }
}

impl Decodable for String {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let bytes = r.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::Invalid(format!("invalid utf-8: {e}")))
    }
}

impl<T: Encodable> Encodable for Option<T> {
    fn encode(&self, w: &mut Writer) {
        match self {
            Some(value) => value.encode(w),
            None => {
                w.write_null();
            }
        }
    }
}

impl<T: Decodable> Decodable for Option<T> {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        if r.peek_null() {
            r.read_null()?;
            return Ok(None);
        }
        T::decode(r).map(Some)
    }
}

/// Sequences encode as a list of their elements.
///
/// `Vec<u8>` is a byte string, so use [`encode_list`] / [`decode_list`] for
/// sequences of other element types.
pub fn encode_list<T: Encodable>(w: &mut Writer, items: &[T]) {
    w.begin_list();
    for item in items {
        item.encode(w);
    }
    w.end_list();
}

/// Decode a list whose items are all `T`.
pub fn decode_list<T: Decodable>(r: &mut Reader<'_>) -> Result<Vec<T>, CodecError> {
    let mut list = r.read_list()?;
    let mut items = Vec::new();
    while list.has_next() {
        items.push(T::decode(&mut list)?);
    }
    list.finish()?;
    Ok(items)
}
