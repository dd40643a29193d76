//! Decoded values.

use serde::Serialize;
use serde_json::{Map, Value};

/// A value reconstructed from storage bytes according to a [`Shape`].
///
/// Fixed and variable-length byte strings both decode to [`Bytes`]; fixed
/// and variable-length sequences both decode to [`Sequence`]. The shape,
/// not the value, remembers which one was on the wire.
///
/// [`Shape`]: super::Shape
/// [`Bytes`]: TypedValue::Bytes
/// [`Sequence`]: TypedValue::Sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypedValue {
    UInt(u128),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    Option(Option<Box<TypedValue>>),
    Sequence(Vec<TypedValue>),
    Record(Vec<(String, TypedValue)>),
}

impl TypedValue {
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[TypedValue]> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// The inner value of a present `Option`. `None` both for an absent
    /// option and for values that are not options at all.
    pub fn as_present(&self) -> Option<&TypedValue> {
        match self {
            Self::Option(Some(inner)) => Some(inner),
            _ => None,
        }
    }

    /// Looks up a record field by name.
    pub fn field(&self, name: &str) -> Option<&TypedValue> {
        match self {
            Self::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Renders the value as JSON for tooling output.
    ///
    /// Bytes become `0x`-prefixed hex. Integers that do not fit a `u64`
    /// become decimal strings so JSON consumers never lose precision.
    pub fn to_json(&self) -> Value {
        match self {
            Self::UInt(v) => match u64::try_from(*v) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(v.to_string()),
            },
            Self::Bool(v) => Value::Bool(*v),
            Self::Bytes(v) => Value::String(format!("0x{}", hex::encode(v))),
            Self::Text(v) => Value::String(v.clone()),
            Self::Option(None) => Value::Null,
            Self::Option(Some(inner)) => inner.to_json(),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Record(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}
