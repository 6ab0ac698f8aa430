//! # BMV Codec
//!
//! Canonical binary encoding ("RLPn") for BTP relay messages, BTP block
//! metadata and persisted verifier state.
//!
//! ## Format
//!
//! Plain RLP with two extensions used by the source chain's object writer:
//!
//! | Value | Encoding |
//! |-------|----------|
//! | null | `0xf8 0x00` |
//! | integer | minimal big-endian two's-complement bytes (`0` → `0x00`, `128` → `0x00 0x80`) |
//!
//! Everything that is hashed or signed is hashed over this encoding, so the
//! writer must stay byte-for-byte stable and the reader must reject every
//! non-canonical form.
//!
//! ## Module Structure
//!
//! ```text
//! bmv-codec/
//! ├── writer.rs    # Streaming encoder
//! ├── reader.rs    # Strict zero-copy decoder
//! ├── traits.rs    # Encodable / Decodable
//! └── errors.rs    # CodecError
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod reader;
pub mod traits;
pub mod writer;

pub use errors::CodecError;
pub use reader::{decode_integer, Reader};
pub use traits::{decode_list, encode_list, Decodable, Encodable};
pub use writer::{integer_bytes, Writer, NULL_MARKER};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
