//! Shape descriptions for the decoder.
//!
//! A [`Shape`] tells the decoder what the bytes are supposed to be. Storage
//! values carry no type information on the wire, so every query site states
//! the layout it expects and the decoder either produces exactly that or
//! fails.
//!
//! Shapes also have a compact textual form, used by the CLI and in error
//! messages:
//!
//! ```text
//! u8 u16 u32 u64 u128      fixed-width little-endian integers
//! compact                  compact (variable-length) unsigned integer
//! bool                     one byte, 0 or 1
//! text                     compact length + UTF-8
//! bytes | Vec<u8>          compact length + raw bytes
//! [u8; 38]                 fixed-size byte array
//! [u64; 4]                 fixed-length array of any shape
//! Option<T>                presence tag + T
//! Vec<T>                   compact count + T...
//! {peer: [u8; 38], n: u32} record, fields in declaration order
//! AccountId | PeerId       aliases for [u8; 32] / [u8; 38]
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::config::{ACCOUNT_ID_LEN, PEER_ID_LEN};

/// Width of a fixed-size unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
}

impl IntWidth {
    /// Encoded size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
            Self::U128 => 16,
        }
    }

    /// Largest value representable at this width.
    pub const fn max_value(self) -> u128 {
        match self {
            Self::U8 => u8::MAX as u128,
            Self::U16 => u16::MAX as u128,
            Self::U32 => u32::MAX as u128,
            Self::U64 => u64::MAX as u128,
            Self::U128 => u128::MAX,
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.bytes() * 8)
    }
}

/// A named record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// The expected layout of an encoded value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Shape {
    /// Fixed-width little-endian unsigned integer.
    UInt(IntWidth),
    /// Compact-encoded unsigned integer (up to `u128`).
    Compact,
    /// Single byte, `0x00` or `0x01`.
    Bool,
    /// Byte array whose length is part of the shape, not the stream.
    FixedBytes(usize),
    /// Compact length prefix followed by raw bytes.
    Bytes,
    /// Compact length prefix followed by UTF-8.
    Text,
    /// Presence tag (`0x00` absent, `0x01` present) followed by the inner shape.
    Option(Box<Shape>),
    /// Compact count followed by that many inner values.
    Sequence(Box<Shape>),
    /// Exactly `n` inner values, no length prefix.
    Array(usize, Box<Shape>),
    /// Named fields decoded in declaration order.
    Record(Vec<Field>),
}

impl Shape {
    pub fn u8() -> Self {
        Self::UInt(IntWidth::U8)
    }

    pub fn u16() -> Self {
        Self::UInt(IntWidth::U16)
    }

    pub fn u32() -> Self {
        Self::UInt(IntWidth::U32)
    }

    pub fn u64() -> Self {
        Self::UInt(IntWidth::U64)
    }

    pub fn u128() -> Self {
        Self::UInt(IntWidth::U128)
    }

    pub fn option(inner: Shape) -> Self {
        Self::Option(Box::new(inner))
    }

    pub fn sequence(inner: Shape) -> Self {
        Self::Sequence(Box::new(inner))
    }

    pub fn array(len: usize, inner: Shape) -> Self {
        Self::Array(len, Box::new(inner))
    }

    /// Builds a record from `(name, shape)` pairs.
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Shape)>,
        S: Into<String>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, shape)| Field::new(name, shape))
                .collect(),
        )
    }

    /// A 32-byte account identifier.
    pub fn account_id() -> Self {
        Self::FixedBytes(ACCOUNT_ID_LEN)
    }

    /// A 38-byte peer identifier.
    pub fn peer_id() -> Self {
        Self::FixedBytes(PEER_ID_LEN)
    }

    /// Smallest number of bytes any value of this shape can occupy.
    ///
    /// The decoder uses this to reject element counts that cannot possibly
    /// fit in the remaining buffer before it allocates anything.
    pub fn min_encoded_len(&self) -> usize {
        match self {
            Self::UInt(width) => width.bytes(),
            Self::Compact | Self::Bool | Self::Bytes | Self::Text => 1,
            Self::Option(_) | Self::Sequence(_) => 1,
            Self::FixedBytes(len) => *len,
            Self::Array(len, inner) => len.saturating_mul(inner.min_encoded_len()),
            Self::Record(fields) => fields
                .iter()
                .fold(0usize, |acc, f| acc.saturating_add(f.shape.min_encoded_len())),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(width) => write!(f, "{}", width),
            Self::Compact => f.write_str("compact"),
            Self::Bool => f.write_str("bool"),
            Self::FixedBytes(len) => write!(f, "[u8; {}]", len),
            Self::Bytes => f.write_str("bytes"),
            Self::Text => f.write_str("text"),
            Self::Option(inner) => write!(f, "Option<{}>", inner),
            Self::Sequence(inner) => write!(f, "Vec<{}>", inner),
            Self::Array(len, inner) => write!(f, "[{}; {}]", inner, len),
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.shape)?;
                }
                f.write_str("}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Errors from parsing the textual shape grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeParseError {
    #[error("unexpected end of shape expression")]
    UnexpectedEnd,

    #[error("unexpected '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("unknown shape '{0}'")]
    UnknownShape(String),

    #[error("invalid array length '{0}'")]
    InvalidLength(String),

    #[error("trailing input at position {0}")]
    TrailingInput(usize),

    #[error("shape nests too deeply at position {0}")]
    TooDeep(usize),
}

/// Deepest nesting the shape grammar accepts.
pub const MAX_SHAPE_DEPTH: usize = 32;

impl FromStr for Shape {
    type Err = ShapeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            src: s,
            pos: 0,
            depth: 0,
        };
        let shape = parser.shape()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(ShapeParseError::TrailingInput(parser.pos));
        }
        Ok(shape)
    }
}

/// Recursive-descent parser over the shape grammar.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn expect(&mut self, want: char) -> Result<(), ShapeParseError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(ShapeParseError::UnexpectedChar {
                found,
                position: self.pos,
            }),
            None => Err(ShapeParseError::UnexpectedEnd),
        }
    }

    fn ident(&mut self) -> Result<&'a str, ShapeParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return match self.peek() {
                Some(found) => Err(ShapeParseError::UnexpectedChar {
                    found,
                    position: self.pos,
                }),
                None => Err(ShapeParseError::UnexpectedEnd),
            };
        }
        Ok(&self.src[start..self.pos])
    }

    fn shape(&mut self) -> Result<Shape, ShapeParseError> {
        self.skip_ws();
        if self.depth == MAX_SHAPE_DEPTH {
            return Err(ShapeParseError::TooDeep(self.pos));
        }
        self.depth += 1;
        let shape = self.shape_at_depth();
        self.depth -= 1;
        shape
    }

    fn shape_at_depth(&mut self) -> Result<Shape, ShapeParseError> {
        match self.peek() {
            None => Err(ShapeParseError::UnexpectedEnd),
            Some('[') => self.array(),
            Some('{') => self.record(),
            Some(_) => {
                let name = self.ident()?;
                self.named(name)
            }
        }
    }

    fn named(&mut self, name: &str) -> Result<Shape, ShapeParseError> {
        let shape = match name {
            "u8" => Shape::u8(),
            "u16" => Shape::u16(),
            "u32" => Shape::u32(),
            "u64" => Shape::u64(),
            "u128" => Shape::u128(),
            "compact" | "Compact" => Shape::Compact,
            "bool" => Shape::Bool,
            "text" | "str" | "String" => Shape::Text,
            "bytes" | "Bytes" => Shape::Bytes,
            "AccountId" => Shape::account_id(),
            "PeerId" => Shape::peer_id(),
            "Option" => {
                self.expect('<')?;
                let inner = self.shape()?;
                self.expect('>')?;
                Shape::option(inner)
            }
            "Vec" => {
                self.expect('<')?;
                let inner = self.shape()?;
                self.expect('>')?;
                match inner {
                    Shape::UInt(IntWidth::U8) => Shape::Bytes,
                    other => Shape::sequence(other),
                }
            }
            other => return Err(ShapeParseError::UnknownShape(other.to_string())),
        };
        Ok(shape)
    }

    fn array(&mut self) -> Result<Shape, ShapeParseError> {
        self.expect('[')?;
        let inner = self.shape()?;
        self.expect(';')?;
        let digits = self.ident()?;
        let len: usize = digits
            .parse()
            .map_err(|_| ShapeParseError::InvalidLength(digits.to_string()))?;
        self.expect(']')?;
        Ok(match inner {
            Shape::UInt(IntWidth::U8) => Shape::FixedBytes(len),
            other => Shape::array(len, other),
        })
    }

    fn record(&mut self) -> Result<Shape, ShapeParseError> {
        self.expect('{')?;
        let mut fields = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                break;
            }
            if !fields.is_empty() {
                self.expect(',')?;
                self.skip_ws();
                // Trailing comma.
                if self.peek() == Some('}') {
                    self.pos += 1;
                    break;
                }
            }
            let name = self.ident()?.to_string();
            self.expect(':')?;
            let shape = self.shape()?;
            fields.push(Field { name, shape });
        }
        Ok(Shape::Record(fields))
    }
}
