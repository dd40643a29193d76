//! # Storage Value Codec
//!
//! Storage values come back from the node as opaque bytes in the SCALE
//! layout: no field names, no type tags, no self-description. This module
//! turns those bytes into typed values given a caller-supplied [`Shape`],
//! and back again.
//!
//! ```text
//! shape.rs    — Shape description and its textual grammar
//! value.rs    — TypedValue union and JSON rendering
//! compact.rs  — compact integer read/write
//! decoder.rs  — bytes + Shape -> TypedValue, bounds-checked
//! encoder.rs  — TypedValue + Shape -> bytes (canonical serializer)
//! ```
//!
//! One decoder serves every storage item. Adding a new query means writing
//! a new shape, not a new decode routine.

pub mod compact;
pub mod decoder;
pub mod encoder;
pub mod shape;
pub mod value;

mod error;

pub use decoder::{decode, decode_prefix, decode_with, DecodeMode};
pub use encoder::{encode, encode_into};
pub use error::{DecodeError, EncodeError};
pub use shape::{Field, IntWidth, Shape, ShapeParseError, MAX_SHAPE_DEPTH};
pub use value::TypedValue;
