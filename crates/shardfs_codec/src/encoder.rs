//! Canonical CBOR encoder.
//!
//! Every item starts with a head byte: the major type in the top three
//! bits and either the argument itself (< 24) or the width of the
//! big-endian argument that follows (24..=27). Canonical form always picks
//! the narrowest width.

use crate::error::CodecResult;
use crate::value::Value;

#[derive(Clone, Copy)]
#[repr(u8)]
enum Major {
    Unsigned = 0,
    Negative = 1,
    Bytes = 2,
    Text = 3,
    Map = 5,
}

/// Appends an item head for `major` with argument `arg`.
#[allow(clippy::cast_possible_truncation)]
fn write_head(out: &mut Vec<u8>, major: Major, arg: u64) {
    let high = (major as u8) << 5;
    match arg {
        0..=23 => out.push(high | arg as u8),
        24..=0xff => out.extend_from_slice(&[high | 24, arg as u8]),
        0x100..=0xffff => {
            out.push(high | 25);
            out.extend_from_slice(&(arg as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(high | 26);
            out.extend_from_slice(&(arg as u32).to_be_bytes());
        }
        _ => {
            out.push(high | 27);
            out.extend_from_slice(&arg.to_be_bytes());
        }
    }
}

/// Encodes `value` to canonical CBOR bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be encoded.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Accumulates canonical CBOR items into one buffer.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    out: Vec<u8>,
}

impl CanonicalEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty encoder with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    /// Appends one value.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested value cannot be encoded.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Integer(n) if *n >= 0 => write_head(&mut self.out, Major::Unsigned, n.unsigned_abs()),
            // -1 - n fits in u64 for every negative i64, including i64::MIN.
            Value::Integer(n) => write_head(&mut self.out, Major::Negative, !(*n as u64)),
            Value::Bytes(bytes) => {
                write_head(&mut self.out, Major::Bytes, bytes.len() as u64);
                self.out.extend_from_slice(bytes);
            }
            Value::Text(text) => {
                write_head(&mut self.out, Major::Text, text.len() as u64);
                self.out.extend_from_slice(text.as_bytes());
            }
            Value::Map(pairs) => return self.encode_map(pairs),
        }
        Ok(())
    }

    /// The bytes encoded so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Consumes the encoder, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    fn encode_map(&mut self, pairs: &[(Value, Value)]) -> CodecResult<()> {
        let mut entries = pairs
            .iter()
            .map(|(k, v)| to_canonical_cbor(k).map(|key| (key, v)))
            .collect::<CodecResult<Vec<_>>>()?;
        entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        write_head(&mut self.out, Major::Map, entries.len() as u64);
        for (key, value) in entries {
            self.out.extend_from_slice(&key);
            self.encode(value)?;
        }
        Ok(())
    }
}
