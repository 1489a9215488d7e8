//! Canonical CBOR decoder.
//!
//! Accepts exactly what the encoder produces: narrowest-width heads,
//! definite lengths and strictly ascending map keys. Anything else, even
//! if it is valid CBOR, is an error.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Largest map the decoder accepts. Records have a handful of fields.
const MAX_MAP_ELEMENTS: u64 = 1024;

/// Largest byte or text string the decoder accepts.
const MAX_BYTES_LENGTH: u64 = 16 * 1024 * 1024;

/// Deepest map nesting the decoder accepts.
const MAX_NESTING_DEPTH: usize = 16;

/// Decodes exactly one value from `bytes`.
///
/// # Errors
///
/// Returns an error if the bytes are not one canonical value in the
/// supported subset, including when bytes follow the value.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    match decoder.remaining().len() {
        0 => Ok(value),
        n => Err(CodecError::invalid_structure(format!(
            "{n} trailing bytes after value"
        ))),
    }
}

/// Reads canonical CBOR values one after another from a byte slice.
#[derive(Debug)]
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> CanonicalDecoder<'a> {
    /// Starts decoding at the beginning of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Decodes the next value.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated, non-canonical or unsupported input.
    pub fn decode(&mut self) -> CodecResult<Value> {
        let (major, arg) = self.read_head()?;
        match major {
            0 => i64::try_from(arg)
                .map(Value::Integer)
                .map_err(|_| CodecError::IntegerOverflow),
            1 => i64::try_from(arg)
                .map(|n| Value::Integer(-1 - n))
                .map_err(|_| CodecError::IntegerOverflow),
            2 => Ok(Value::Bytes(self.take_string(arg)?.to_vec())),
            3 => {
                let raw = self.take_string(arg)?;
                std::str::from_utf8(raw)
                    .map(|s| Value::Text(s.to_owned()))
                    .map_err(|_| CodecError::InvalidUtf8)
            }
            5 => self.take_map(arg),
            4 => Err(CodecError::unsupported_type("array")),
            6 => Err(CodecError::unsupported_type("tag")),
            _ => Err(CodecError::unsupported_type("float or simple value")),
        }
    }

    /// True once every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining().is_empty()
    }

    /// The bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < len {
            return Err(CodecError::UnexpectedEof);
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Reads a head, returning the major type and its argument.
    ///
    /// Major types 7 (floats and simple values) are returned with a zero
    /// argument so the caller can reject them by type.
    fn read_head(&mut self) -> CodecResult<(u8, u64)> {
        let first = self.take(1)?[0];
        let (major, info) = (first >> 5, first & 0x1f);
        if major == 7 {
            return Ok((major, 0));
        }

        let (arg, floor) = match info {
            0..=23 => return Ok((major, u64::from(info))),
            24 => (u64::from(self.take(1)?[0]), 24),
            25 => (be_uint(self.take(2)?), 0x100),
            26 => (be_uint(self.take(4)?), 0x1_0000),
            27 => (be_uint(self.take(8)?), 0x1_0000_0000),
            31 => {
                return Err(CodecError::invalid_structure(
                    "indefinite-length items are not allowed",
                ))
            }
            _ => return Err(CodecError::invalid_structure("reserved head value")),
        };
        if arg < floor {
            return Err(CodecError::invalid_structure(format!(
                "non-canonical head: {arg} fits a narrower width"
            )));
        }
        Ok((major, arg))
    }

    fn take_string(&mut self, len: u64) -> CodecResult<&'a [u8]> {
        if len > MAX_BYTES_LENGTH {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_BYTES_LENGTH,
            });
        }
        let len = usize::try_from(len).map_err(|_| CodecError::IntegerOverflow)?;
        self.take(len)
    }

    fn take_map(&mut self, len: u64) -> CodecResult<Value> {
        if len > MAX_MAP_ELEMENTS {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_MAP_ELEMENTS,
            });
        }
        if self.depth == MAX_NESTING_DEPTH {
            return Err(CodecError::invalid_structure(format!(
                "maps nested deeper than {MAX_NESTING_DEPTH}"
            )));
        }

        self.depth += 1;
        let pairs = self.take_pairs(len);
        self.depth -= 1;
        pairs.map(Value::Map)
    }

    fn take_pairs(&mut self, len: u64) -> CodecResult<Vec<(Value, Value)>> {
        let mut pairs = Vec::with_capacity(len as usize);
        let data = self.data;
        let mut last_key: &'a [u8] = &[];
        for _ in 0..len {
            let start = self.pos;
            let key = self.decode()?;
            let key_bytes = &data[start..self.pos];
            let ascending = pairs.is_empty()
                || (last_key.len(), last_key) < (key_bytes.len(), key_bytes);
            if !ascending {
                return Err(CodecError::invalid_structure(
                    "map keys out of canonical order",
                ));
            }
            last_key = key_bytes;
            pairs.push((key, self.decode()?));
        }
        Ok(pairs)
    }
}

fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, b| (acc << 8) | u64::from(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_canonical_cbor;

    fn structural(bytes: &[u8]) -> bool {
        matches!(from_cbor(bytes), Err(CodecError::InvalidStructure { .. }))
    }

    #[test]
    fn integers() {
        assert_eq!(from_cbor(&[0x0a]).unwrap(), Value::Integer(10));
        assert_eq!(from_cbor(&[0x19, 0x03, 0xe8]).unwrap(), Value::Integer(1000));
        assert_eq!(from_cbor(&[0x29]).unwrap(), Value::Integer(-10));
        assert_eq!(from_cbor(&[0x39, 0x01, 0xf3]).unwrap(), Value::Integer(-500));
    }

    #[test]
    fn extreme_integers() {
        let min = to_canonical_cbor(&Value::Integer(i64::MIN)).unwrap();
        assert_eq!(from_cbor(&min).unwrap(), Value::Integer(i64::MIN));

        let mut too_big = vec![0x1b];
        too_big.extend_from_slice(&u64::MAX.to_be_bytes());
        assert_eq!(from_cbor(&too_big), Err(CodecError::IntegerOverflow));
        too_big[0] = 0x3b;
        assert_eq!(from_cbor(&too_big), Err(CodecError::IntegerOverflow));
    }

    #[test]
    fn overlong_heads_are_rejected() {
        assert!(structural(&[0x18, 0x17]));
        assert!(structural(&[0x19, 0x00, 0xff]));
        assert!(structural(&[0x1a, 0x00, 0x00, 0xff, 0xff]));
        assert!(structural(&[0x1b, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]));
        assert!(structural(&[0x78, 0x01, b'a']));
    }

    #[test]
    fn map_key_order_is_enforced() {
        // {1: 0, 2: 0} is fine; {2: 0, 1: 0} and {1: 0, 1: 0} are not.
        assert!(from_cbor(&[0xa2, 0x01, 0x00, 0x02, 0x00]).is_ok());
        assert!(structural(&[0xa2, 0x02, 0x00, 0x01, 0x00]));
        assert!(structural(&[0xa2, 0x01, 0x00, 0x01, 0x00]));
        // A one-byte key sorts before a two-byte key: {23: 0, 24: 0}.
        assert!(from_cbor(&[0xa2, 0x17, 0x00, 0x18, 0x18, 0x00]).is_ok());
    }

    #[test]
    fn unsupported_major_types() {
        for bytes in [&[0x81, 0x00][..], &[0xc1, 0x00], &[0xf5], &[0xf9, 0x3c, 0x00]] {
            assert!(
                matches!(from_cbor(bytes), Err(CodecError::UnsupportedType { .. })),
                "{bytes:02x?}"
            );
        }
    }

    #[test]
    fn indefinite_and_reserved_heads() {
        assert!(structural(&[0x5f]));
        assert!(structural(&[0xbf]));
        assert!(structural(&[0x1c]));
    }

    #[test]
    fn size_limits() {
        assert!(matches!(
            from_cbor(&[0x5a, 0xff, 0xff, 0xff, 0xff]),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
        assert!(matches!(
            from_cbor(&[0xb9, 0xff, 0xff]),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        // {0: {0: ... {0: 0}}}
        let nested = |depth: usize| {
            let mut bytes = [0xa1u8, 0x00].repeat(depth);
            bytes.push(0x00);
            bytes
        };
        assert!(from_cbor(&nested(MAX_NESTING_DEPTH)).is_ok());
        assert!(structural(&nested(MAX_NESTING_DEPTH + 1)));
        assert!(structural(&[0xa1u8, 0x00].repeat(10_000)));

        let mut decoder = CanonicalDecoder::new(&[0xa1, 0x00, 0xa1, 0x00, 0x00, 0x05]);
        assert!(decoder.decode().is_ok());
        assert_eq!(decoder.decode().unwrap(), Value::Integer(5));
    }

    #[test]
    fn truncation() {
        assert_eq!(from_cbor(&[]), Err(CodecError::UnexpectedEof));
        assert_eq!(from_cbor(&[0x19, 0x01]), Err(CodecError::UnexpectedEof));
        assert_eq!(from_cbor(&[0x64, b'c', b'p']), Err(CodecError::UnexpectedEof));
        assert_eq!(from_cbor(&[0xa1, 0x01]), Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_and_bad_utf8() {
        assert!(structural(&[0x00, 0x00]));
        assert_eq!(from_cbor(&[0x61, 0xc3]), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn sequential_decoding() {
        let mut bytes = to_canonical_cbor(&Value::Text("cpu".into())).unwrap();
        bytes.push(0x05);
        let mut decoder = CanonicalDecoder::new(&bytes);
        assert_eq!(decoder.decode().unwrap(), Value::Text("cpu".into()));
        assert_eq!(decoder.position(), 4);
        assert_eq!(decoder.remaining(), &[0x05]);
        assert_eq!(decoder.decode().unwrap(), Value::Integer(5));
        assert!(decoder.is_empty());
    }
}
