//! Fileset record shapes.
//!
//! Both records are canonical CBOR maps keyed by small integer tags.
//! Decoders ignore tags they do not know, so fields can be added later
//! without breaking older readers.

use crate::decoder::from_cbor;
use crate::encoder::to_canonical_cbor;
use crate::error::{CodecError, CodecResult};
use crate::frame::{decode_frame, encode_frame};
use crate::value::Value;
use crate::{Decode, Encode};

/// Size of the fixed-width entry index that precedes each index-file frame.
pub const INDEX_ENTRY_PREFIX_SIZE: usize = 8;

const INFO_START: u64 = 1;
const INFO_BLOCK_SIZE: u64 = 2;
const INFO_ENTRIES: u64 = 3;

const INDEX_INDEX: u64 = 1;
const INDEX_SIZE: u64 = 2;
const INDEX_OFFSET: u64 = 3;
const INDEX_KEY: u64 = 4;

/// Summary of a fileset, written once when the fileset is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoRecord {
    /// Block start in nanoseconds since the Unix epoch.
    pub start: i64,
    /// Block size in nanoseconds.
    pub block_size: i64,
    /// Number of entries written to the fileset.
    pub entries: u64,
}

/// Location of one entry in the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    /// Position of the entry in write order, starting at 0.
    pub index: u64,
    /// Entry length in bytes.
    pub size: u64,
    /// Byte offset of the entry in the data file.
    pub offset: u64,
    /// Caller-supplied series key.
    pub key: String,
}

impl InfoRecord {
    /// Encodes the record as a single frame.
    pub fn encode_framed(&self) -> CodecResult<Vec<u8>> {
        let payload = self.encode()?;
        let mut out = Vec::with_capacity(payload.len() + crate::FRAME_HEADER_SIZE);
        encode_frame(&payload, &mut out)?;
        Ok(out)
    }

    /// Decodes a framed record from the front of `data`.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn decode_framed(data: &[u8]) -> CodecResult<(Self, usize)> {
        let (payload, consumed) = decode_frame(data)?;
        Ok((Self::decode(payload)?, consumed))
    }
}

impl Encode for InfoRecord {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(&Value::map(vec![
            (tag(INFO_START), Value::Integer(self.start)),
            (tag(INFO_BLOCK_SIZE), Value::Integer(self.block_size)),
            (tag(INFO_ENTRIES), unsigned(self.entries)?),
        ]))
    }
}

impl Decode for InfoRecord {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        const RECORD: &str = "info";
        let value = from_cbor(bytes)?;
        Ok(Self {
            start: int_field(&value, RECORD, INFO_START)?,
            block_size: int_field(&value, RECORD, INFO_BLOCK_SIZE)?,
            entries: unsigned_field(&value, RECORD, INFO_ENTRIES)?,
        })
    }
}

impl IndexRecord {
    /// Appends the index-file form of this record to `out`: the entry index
    /// as a fixed-width little-endian `u64`, then the framed record.
    pub fn encode_entry(&self, out: &mut Vec<u8>) -> CodecResult<()> {
        let payload = self.encode()?;
        out.reserve(INDEX_ENTRY_PREFIX_SIZE + crate::FRAME_HEADER_SIZE + payload.len());
        out.extend_from_slice(&self.index.to_le_bytes());
        encode_frame(&payload, out)
    }

    /// Decodes one index-file entry from the front of `data`.
    ///
    /// Returns the record and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Fails on truncated input, or when the fixed-width prefix disagrees
    /// with the index stored in the record.
    pub fn decode_entry(data: &[u8]) -> CodecResult<(Self, usize)> {
        let prefix = data
            .get(..INDEX_ENTRY_PREFIX_SIZE)
            .ok_or(CodecError::UnexpectedEof)?;
        let mut raw = [0u8; INDEX_ENTRY_PREFIX_SIZE];
        raw.copy_from_slice(prefix);
        let index = u64::from_le_bytes(raw);

        let (payload, consumed) = decode_frame(&data[INDEX_ENTRY_PREFIX_SIZE..])?;
        let record = Self::decode(payload)?;
        if record.index != index {
            return Err(CodecError::invalid_structure(format!(
                "index prefix {index} does not match record index {}",
                record.index
            )));
        }
        Ok((record, INDEX_ENTRY_PREFIX_SIZE + consumed))
    }
}

impl Encode for IndexRecord {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(&Value::map(vec![
            (tag(INDEX_INDEX), unsigned(self.index)?),
            (tag(INDEX_SIZE), unsigned(self.size)?),
            (tag(INDEX_OFFSET), unsigned(self.offset)?),
            (tag(INDEX_KEY), Value::Text(self.key.clone())),
        ]))
    }
}

impl Decode for IndexRecord {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        const RECORD: &str = "index";
        let value = from_cbor(bytes)?;
        let key = value
            .field(INDEX_KEY)
            .ok_or(CodecError::MissingField {
                record: RECORD,
                tag: INDEX_KEY,
            })?
            .as_text()
            .ok_or(CodecError::FieldType {
                record: RECORD,
                tag: INDEX_KEY,
            })?
            .to_string();
        Ok(Self {
            index: unsigned_field(&value, RECORD, INDEX_INDEX)?,
            size: unsigned_field(&value, RECORD, INDEX_SIZE)?,
            offset: unsigned_field(&value, RECORD, INDEX_OFFSET)?,
            key,
        })
    }
}

/// Decodes every entry of an index file, in file order.
///
/// # Errors
///
/// Fails on the first malformed or truncated entry.
pub fn decode_index_entries(mut data: &[u8]) -> CodecResult<Vec<IndexRecord>> {
    let mut records = Vec::new();
    while !data.is_empty() {
        let (record, consumed) = IndexRecord::decode_entry(data)?;
        records.push(record);
        data = &data[consumed..];
    }
    Ok(records)
}

#[allow(clippy::cast_possible_wrap)]
fn tag(t: u64) -> Value {
    // Tags are small constants.
    Value::Integer(t as i64)
}

fn unsigned(n: u64) -> CodecResult<Value> {
    i64::try_from(n)
        .map(Value::Integer)
        .map_err(|_| CodecError::IntegerOverflow)
}

fn int_field(value: &Value, record: &'static str, tag: u64) -> CodecResult<i64> {
    value
        .field(tag)
        .ok_or(CodecError::MissingField { record, tag })?
        .as_integer()
        .ok_or(CodecError::FieldType { record, tag })
}

fn unsigned_field(value: &Value, record: &'static str, tag: u64) -> CodecResult<u64> {
    let n = int_field(value, record, tag)?;
    u64::try_from(n).map_err(|_| CodecError::FieldType { record, tag })
}
