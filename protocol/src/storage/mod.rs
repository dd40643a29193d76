//! # Storage Addressing
//!
//! Everything needed to name a slot in the node's key-value state before
//! asking for it.
//!
//! ```text
//! hasher.rs — StorageHasher: how one key parameter becomes key bytes
//! key.rs    — StorageKey, StorageAddress, StorageKeyBuilder
//! items.rs  — StorageItem: pallet + item + declared hashers, and the
//!             items this client queries
//! ```
//!
//! Addressing is pure: no I/O, no failure mode at runtime. Invalid pallet or
//! item names are programming errors and panic at the call site.

pub mod hasher;
pub mod items;
pub mod key;

pub use hasher::StorageHasher;
pub use items::StorageItem;
pub use key::{storage_prefix, KeyParam, StorageAddress, StorageKey, StorageKeyBuilder};
