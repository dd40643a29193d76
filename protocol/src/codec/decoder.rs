//! Bounds-checked decoding of storage payloads.
//!
//! The decoder walks a [`Shape`] and a byte slice together. Every read is
//! preceded by a length check against what is left of the slice, so a short,
//! truncated, or hostile payload surfaces as a [`DecodeError`] carrying the
//! offending offset, never as a panic or an out-of-range read.

use super::compact::{read_compact, CompactFault};
use super::error::DecodeError;
use super::shape::{IntWidth, Shape};
use super::value::TypedValue;

/// What to do with bytes left after the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Leftover bytes are a [`DecodeError::TrailingBytes`].
    #[default]
    Exact,
    /// Only the leading value is read. Storage records that grew fields
    /// at the end still decode under their older shape.
    Leading,
}

/// Decodes `bytes` as `shape`, requiring every byte to be consumed.
///
/// ```
/// use cess_query::codec::{decode, Shape, TypedValue};
///
/// let shape: Shape = "{count: u32, live: bool}".parse().unwrap();
/// let value = decode(&[7, 0, 0, 0, 1], &shape).unwrap();
/// assert_eq!(value.field("count"), Some(&TypedValue::UInt(7)));
/// assert!(decode(&[7, 0, 0, 0], &shape).is_err());
/// ```
pub fn decode(bytes: &[u8], shape: &Shape) -> Result<TypedValue, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let value = cursor.value(shape)?;
    if cursor.remaining() > 0 {
        return Err(DecodeError::TrailingBytes {
            offset: cursor.offset,
            shape: shape.to_string(),
            remaining: cursor.remaining(),
        });
    }
    Ok(value)
}

/// Decodes `bytes` as `shape` under `mode`.
///
/// ```
/// use cess_query::codec::{decode_with, DecodeMode, Shape, TypedValue};
///
/// let value = decode_with(&[1, 0, 9], &Shape::u16(), DecodeMode::Leading).unwrap();
/// assert_eq!(value, TypedValue::UInt(1));
/// assert!(decode_with(&[1, 0, 9], &Shape::u16(), DecodeMode::Exact).is_err());
/// ```
pub fn decode_with(
    bytes: &[u8],
    shape: &Shape,
    mode: DecodeMode,
) -> Result<TypedValue, DecodeError> {
    match mode {
        DecodeMode::Exact => decode(bytes, shape),
        DecodeMode::Leading => decode_prefix(bytes, shape).map(|(value, _)| value),
    }
}

/// Decodes one `shape` from the front of `bytes`.
///
/// Returns the value and the number of bytes it occupied. Anything after
/// that is left for the caller.
pub fn decode_prefix(bytes: &[u8], shape: &Shape) -> Result<(TypedValue, usize), DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let value = cursor.value(shape)?;
    Ok((value, cursor.offset))
}

/// Read position over an immutable input buffer.
struct Cursor<'a> {
    input: &'a [u8],
    offset: usize,
    /// Zero-sized elements decoded so far. Capped at the input length.
    zero_sized: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            zero_sized: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    /// Takes exactly `len` bytes or fails without moving.
    fn take(&mut self, len: usize, shape: &Shape) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.offset,
                shape: shape.to_string(),
                needed: len,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.input[start..self.offset])
    }

    fn byte(&mut self, shape: &Shape) -> Result<u8, DecodeError> {
        Ok(self.take(1, shape)?[0])
    }

    fn compact(&mut self, shape: &Shape) -> Result<u128, DecodeError> {
        let rest = &self.input[self.offset..];
        match read_compact(rest) {
            Ok((value, used)) => {
                self.offset += used;
                Ok(value)
            }
            Err(CompactFault::Short { needed }) => Err(DecodeError::UnexpectedEnd {
                offset: self.offset,
                shape: shape.to_string(),
                needed,
                remaining: rest.len(),
            }),
            Err(CompactFault::NonCanonical) => Err(DecodeError::NonCanonicalCompact {
                offset: self.offset,
                shape: shape.to_string(),
            }),
            Err(CompactFault::Overflow { byte_len }) => Err(DecodeError::CompactOverflow {
                offset: self.offset,
                shape: shape.to_string(),
                byte_len,
            }),
        }
    }

    /// Reads a length prefix and checks that `len` elements of `element`
    /// could fit in what is left. Elements that encode to zero bytes are
    /// budgeted at one byte each so a forged count cannot spin the decoder.
    fn length_prefix(&mut self, shape: &Shape, element: usize) -> Result<usize, DecodeError> {
        let start = self.offset;
        let declared = self.compact(shape)?;
        let remaining = self.remaining();
        let budget = (remaining / element.max(1)) as u128;
        if declared > budget {
            return Err(DecodeError::LengthOverrun {
                offset: start,
                shape: shape.to_string(),
                declared,
                remaining,
            });
        }
        // `declared <= remaining`, which is a usize.
        Ok(declared as usize)
    }

    /// Charges `count` elements of `element` against the zero-sized budget.
    /// Elements that occupy bytes are paid for by the bytes themselves.
    fn claim_elements(
        &mut self,
        count: usize,
        element: &Shape,
        at: usize,
        shape: &Shape,
    ) -> Result<(), DecodeError> {
        if element.min_encoded_len() > 0 {
            return Ok(());
        }
        let left = self.input.len() - self.zero_sized;
        if count > left {
            return Err(DecodeError::LengthOverrun {
                offset: at,
                shape: shape.to_string(),
                declared: count as u128,
                remaining: left,
            });
        }
        self.zero_sized += count;
        Ok(())
    }

    fn value(&mut self, shape: &Shape) -> Result<TypedValue, DecodeError> {
        match shape {
            Shape::UInt(width) => self.uint(*width, shape).map(TypedValue::UInt),
            Shape::Compact => self.compact(shape).map(TypedValue::UInt),
            Shape::Bool => {
                let at = self.offset;
                match self.byte(shape)? {
                    0 => Ok(TypedValue::Bool(false)),
                    1 => Ok(TypedValue::Bool(true)),
                    byte => Err(DecodeError::InvalidBoolean {
                        offset: at,
                        shape: shape.to_string(),
                        byte,
                    }),
                }
            }
            Shape::FixedBytes(len) => Ok(TypedValue::Bytes(self.take(*len, shape)?.to_vec())),
            Shape::Bytes => {
                let len = self.length_prefix(shape, 1)?;
                Ok(TypedValue::Bytes(self.take(len, shape)?.to_vec()))
            }
            Shape::Text => {
                let len = self.length_prefix(shape, 1)?;
                let at = self.offset;
                let raw = self.take(len, shape)?;
                match std::str::from_utf8(raw) {
                    Ok(text) => Ok(TypedValue::Text(text.to_owned())),
                    Err(_) => Err(DecodeError::InvalidUtf8 {
                        offset: at,
                        shape: shape.to_string(),
                    }),
                }
            }
            Shape::Option(inner) => {
                let at = self.offset;
                match self.byte(shape)? {
                    0 => Ok(TypedValue::Option(None)),
                    1 => Ok(TypedValue::Option(Some(Box::new(self.value(inner)?)))),
                    byte => Err(DecodeError::InvalidOptionTag {
                        offset: at,
                        shape: shape.to_string(),
                        byte,
                    }),
                }
            }
            Shape::Sequence(inner) => {
                let at = self.offset;
                let len = self.length_prefix(shape, inner.min_encoded_len())?;
                self.claim_elements(len, inner, at, shape)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.value(inner)?);
                }
                Ok(TypedValue::Sequence(items))
            }
            Shape::Array(len, inner) => {
                let needed = len.saturating_mul(inner.min_encoded_len().max(1));
                if needed > self.remaining() {
                    return Err(DecodeError::UnexpectedEnd {
                        offset: self.offset,
                        shape: shape.to_string(),
                        needed,
                        remaining: self.remaining(),
                    });
                }
                self.claim_elements(*len, inner, self.offset, shape)?;
                let mut items = Vec::with_capacity(*len);
                for _ in 0..*len {
                    items.push(self.value(inner)?);
                }
                Ok(TypedValue::Sequence(items))
            }
            Shape::Record(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    out.push((field.name.clone(), self.value(&field.shape)?));
                }
                Ok(TypedValue::Record(out))
            }
        }
    }

    fn uint(&mut self, width: IntWidth, shape: &Shape) -> Result<u128, DecodeError> {
        let raw = self.take(width.bytes(), shape)?;
        let mut le = [0u8; 16];
        le[..raw.len()].copy_from_slice(raw);
        Ok(u128::from_le_bytes(le))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(decode(&[0x2a], &Shape::u8()), Ok(TypedValue::UInt(42)));
        assert_eq!(
            decode(&[0x01, 0x02], &Shape::u16()),
            Ok(TypedValue::UInt(0x0201))
        );
        assert_eq!(
            decode(&[0x78, 0x56, 0x34, 0x12], &Shape::u32()),
            Ok(TypedValue::UInt(0x1234_5678))
        );
        assert_eq!(
            decode(&[0xff; 16], &Shape::u128()),
            Ok(TypedValue::UInt(u128::MAX))
        );
    }

    #[test]
    fn boolean_rejects_other_bytes() {
        assert_eq!(decode(&[1], &Shape::Bool), Ok(TypedValue::Bool(true)));
        assert_eq!(
            decode(&[2], &Shape::Bool),
            Err(DecodeError::InvalidBoolean {
                offset: 0,
                shape: "bool".into(),
                byte: 2
            })
        );
    }

    #[test]
    fn option_tags() {
        let shape = Shape::option(Shape::u16());
        assert_eq!(decode(&[0], &shape), Ok(TypedValue::Option(None)));
        assert_eq!(
            decode(&[1, 5, 0], &shape),
            Ok(TypedValue::Option(Some(Box::new(TypedValue::UInt(5)))))
        );
        let err = decode(&[7, 5, 0], &shape).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidOptionTag { byte: 7, .. }));
    }

    #[test]
    fn fixed_bytes_take_length_from_shape() {
        let bytes: Vec<u8> = (0..38).collect();
        assert_eq!(
            decode(&bytes, &Shape::peer_id()),
            Ok(TypedValue::Bytes(bytes.clone()))
        );
        let err = decode(&bytes[..37], &Shape::peer_id()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnexpectedEnd {
                offset: 0,
                shape: "[u8; 38]".into(),
                needed: 38,
                remaining: 37
            }
        );
    }

    #[test]
    fn sequence_of_records() {
        let shape: Shape = "Vec<{who: [u8; 2], reward: u32}>".parse().unwrap();
        let bytes = [
            0x08, // two elements
            0xaa, 0xbb, 0x01, 0x00, 0x00, 0x00, //
            0xcc, 0xdd, 0x02, 0x00, 0x00, 0x00,
        ];
        let value = decode(&bytes, &shape).unwrap();
        let items = value.as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].field("reward"), Some(&TypedValue::UInt(2)));
        assert_eq!(
            items[0].field("who"),
            Some(&TypedValue::Bytes(vec![0xaa, 0xbb]))
        );
    }

    #[test]
    fn length_prefix_overrun_is_caught_before_allocation() {
        // Claims 2^30 u64 elements with three bytes of payload.
        let bytes = [0x03, 0x00, 0x00, 0x00, 0x40, 1, 2, 3];
        let err = decode(&bytes, &Shape::sequence(Shape::u64())).unwrap_err();
        assert_eq!(
            err,
            DecodeError::LengthOverrun {
                offset: 0,
                shape: "Vec<u64>".into(),
                declared: 1 << 30,
                remaining: 3
            }
        );
    }

    #[test]
    fn zero_sized_elements_are_budgeted() {
        let empty = Shape::Record(Vec::new());
        // 63 zero-sized elements with no payload behind the prefix.
        let err = decode(&[0xfc], &Shape::sequence(empty)).unwrap_err();
        assert!(matches!(err, DecodeError::LengthOverrun { declared: 63, .. }));
    }

    #[test]
    fn zero_sized_array_is_budgeted_per_element() {
        let shape = Shape::array(usize::MAX / 2, Shape::Record(Vec::new()));
        let err = decode(&[0u8; 8], &shape).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEnd { remaining: 8, .. }));

        let shape = Shape::array(3, Shape::Record(Vec::new()));
        assert!(decode_prefix(&[0u8; 3], &shape).is_ok());
    }

    #[test]
    fn nested_zero_sized_arrays_share_one_budget() {
        // Each level fits the input on its own; together they would be
        // 64 * 64 elements decoded from 64 bytes.
        let inner = Shape::array(64, Shape::Record(Vec::new()));
        let shape = Shape::array(64, inner);
        let err = decode_prefix(&[0u8; 64], &shape).unwrap_err();
        assert!(matches!(err, DecodeError::LengthOverrun { .. }));
    }

    #[test]
    fn leading_mode_ignores_appended_fields() {
        let mut bytes = vec![0xaa; 38];
        bytes.extend_from_slice(&[0x0c, b'a', b'b', b'c']);
        assert_eq!(
            decode_with(&bytes, &Shape::peer_id(), DecodeMode::Leading),
            Ok(TypedValue::Bytes(vec![0xaa; 38]))
        );
        assert!(matches!(
            decode_with(&bytes, &Shape::peer_id(), DecodeMode::Exact),
            Err(DecodeError::TrailingBytes { remaining: 4, .. })
        ));
    }

    #[test]
    fn text_must_be_utf8() {
        assert_eq!(
            decode(&[0x0c, b'c', b'e', b's'], &Shape::Text),
            Ok(TypedValue::Text("ces".into()))
        );
        let err = decode(&[0x08, 0xff, 0xfe], &Shape::Text).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidUtf8 {
                offset: 1,
                shape: "text".into()
            }
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode(&[1, 0, 9], &Shape::u16()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TrailingBytes {
                offset: 2,
                shape: "u16".into(),
                remaining: 1
            }
        );
    }

    #[test]
    fn decode_prefix_reports_consumed_length() {
        let (value, used) = decode_prefix(&[1, 0, 9], &Shape::u16()).unwrap();
        assert_eq!(value, TypedValue::UInt(1));
        assert_eq!(used, 2);
    }

    #[test]
    fn nested_error_reports_inner_offset_and_shape() {
        let shape: Shape = "{a: u32, b: Option<bool>}".parse().unwrap();
        let err = decode(&[0, 0, 0, 0, 1, 5], &shape).unwrap_err();
        assert_eq!(err.offset(), 5);
        assert_eq!(err.shape(), "bool");
    }

    #[test]
    fn array_checks_minimum_size_up_front() {
        let shape = Shape::array(4, Shape::u64());
        let err = decode(&[0u8; 31], &shape).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEnd {
                needed: 32,
                remaining: 31,
                ..
            }
        ));
    }
}
