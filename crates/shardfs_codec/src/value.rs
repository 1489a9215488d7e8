//! Dynamic value type for the record subset of CBOR.

use crate::encoder::to_canonical_cbor;
use std::cmp::Ordering;

/// A dynamic CBOR value.
///
/// Fileset records only need integers, strings and maps, so nothing else
/// is representable. Floats, arrays and simple values are rejected by the
/// decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string (UTF-8).
    Text(String),
    /// Map of key-value pairs.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with keys in canonical order.
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        Value::Map(pairs)
    }

    /// Compare two values by their canonical encodings (length first, then bytewise).
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        match (to_canonical_cbor(self), to_canonical_cbor(other)) {
            (Ok(a), Ok(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(&b)),
            // Unencodable values cannot occur for this subset; keep the sort total.
            _ => Ordering::Equal,
        }
    }

    /// Returns the integer if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up an integer-keyed field of a map.
    ///
    /// Returns `None` for non-map values and absent tags.
    #[must_use]
    pub fn field(&self, tag: u64) -> Option<&Value> {
        let Value::Map(pairs) = self else {
            return None;
        };
        let tag = i64::try_from(tag).ok()?;
        pairs
            .iter()
            .find(|(k, _)| k.as_integer() == Some(tag))
            .map(|(_, v)| v)
    }
}
