//! # Hash Primitives
//!
//! Storage keys and account addresses are built from two hash families:
//! xxHash64 ("twox") for runtime-chosen identifiers and BLAKE2b for
//! user-chosen keys and address checksums. Everything here is a thin wrapper
//! around audited implementations; none of it should be "optimized".

pub mod hash;

pub use hash::{blake2_128, blake2_256, blake2_512_multi, twox_128, twox_256, twox_64};
