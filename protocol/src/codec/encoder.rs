//! Canonical serializer, the inverse of the decoder.
//!
//! Map lookups hash the *encoded* key, so the bytes must match what the
//! runtime would produce for the same value. The same routine backs the
//! decoder's round-trip tests.

use super::compact::write_compact;
use super::error::EncodeError;
use super::shape::Shape;
use super::value::TypedValue;

/// Encodes `value` according to `shape`.
pub fn encode(value: &TypedValue, shape: &Shape) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_into(value, shape, &mut out)?;
    Ok(out)
}

/// Encodes `value` according to `shape`, appending to `out`.
pub fn encode_into(value: &TypedValue, shape: &Shape, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (shape, value) {
        (Shape::UInt(width), TypedValue::UInt(v)) => {
            if *v > width.max_value() {
                return Err(EncodeError::IntegerOverflow {
                    value: *v,
                    shape: shape.to_string(),
                });
            }
            out.extend_from_slice(&v.to_le_bytes()[..width.bytes()]);
        }
        (Shape::Compact, TypedValue::UInt(v)) => write_compact(*v, out),
        (Shape::Bool, TypedValue::Bool(b)) => out.push(u8::from(*b)),
        (Shape::FixedBytes(len), TypedValue::Bytes(bytes)) => {
            if bytes.len() != *len {
                return Err(EncodeError::LengthMismatch {
                    expected: *len,
                    got: bytes.len(),
                    shape: shape.to_string(),
                });
            }
            out.extend_from_slice(bytes);
        }
        (Shape::Bytes, TypedValue::Bytes(bytes)) => {
            write_compact(bytes.len() as u128, out);
            out.extend_from_slice(bytes);
        }
        (Shape::Text, TypedValue::Text(text)) => {
            write_compact(text.len() as u128, out);
            out.extend_from_slice(text.as_bytes());
        }
        (Shape::Option(_), TypedValue::Option(None)) => out.push(0),
        (Shape::Option(inner), TypedValue::Option(Some(v))) => {
            out.push(1);
            encode_into(v, inner, out)?;
        }
        (Shape::Sequence(inner), TypedValue::Sequence(items)) => {
            write_compact(items.len() as u128, out);
            for item in items {
                encode_into(item, inner, out)?;
            }
        }
        (Shape::Array(len, inner), TypedValue::Sequence(items)) => {
            if items.len() != *len {
                return Err(EncodeError::LengthMismatch {
                    expected: *len,
                    got: items.len(),
                    shape: shape.to_string(),
                });
            }
            for item in items {
                encode_into(item, inner, out)?;
            }
        }
        (Shape::Record(fields), TypedValue::Record(values)) => {
            if fields.len() != values.len() {
                return Err(EncodeError::LengthMismatch {
                    expected: fields.len(),
                    got: values.len(),
                    shape: shape.to_string(),
                });
            }
            for (field, (name, v)) in fields.iter().zip(values) {
                if field.name != *name {
                    return Err(EncodeError::FieldMismatch {
                        expected: field.name.clone(),
                        got: name.clone(),
                    });
                }
                encode_into(v, &field.shape, out)?;
            }
        }
        _ => {
            return Err(EncodeError::Mismatch {
                shape: shape.to_string(),
            })
        }
    }
    Ok(())
}
