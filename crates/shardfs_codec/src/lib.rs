//! # shardfs Codec
//!
//! Deterministic binary encoding for fileset records.
//!
//! Records are canonical CBOR maps keyed by integer field tags and wrapped
//! in length-prefixed frames:
//!
//! - Identical records produce identical bytes
//! - Readers find record boundaries from the frame header
//! - Unknown field tags are skipped on decode
//!
//! ## Canonical CBOR Rules
//!
//! - Maps are sorted by key (length-first, then bytewise)
//! - Integers use shortest encoding
//! - No floats, arrays, tags or simple values
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use shardfs_codec::{decode_index_entries, IndexRecord};
//!
//! let record = IndexRecord { index: 0, size: 10, offset: 0, key: "cpu".into() };
//! let mut index_file = Vec::new();
//! record.encode_entry(&mut index_file).unwrap();
//!
//! let decoded = decode_index_entries(&index_file).unwrap();
//! assert_eq!(decoded, vec![record]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod frame;
mod record;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use frame::{decode_frame, encode_frame, FRAME_HEADER_SIZE};
pub use record::{decode_index_entries, IndexRecord, InfoRecord, INDEX_ENTRY_PREFIX_SIZE};
pub use value::Value;

/// Trait for types that can be encoded to canonical CBOR.
pub trait Encode {
    /// Encode this value to canonical CBOR bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from CBOR.
pub trait Decode: Sized {
    /// Decode this value from CBOR bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(self)
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}
