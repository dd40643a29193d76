//! # Chain Identities
//!
//! The two identifier kinds the query layer deals in, and their textual
//! forms.
//!
//! ```text
//! account.rs — AccountId: 32-byte account public key
//! peer.rs    — PeerId: 38-byte gateway peer identifier, base58 text
//! ss58.rs    — AccountCodec trait, Ss58Codec (checksummed account text)
//! error.rs   — IdentityError
//! ```

pub mod account;
mod error;
pub mod peer;
pub mod ss58;

pub use account::AccountId;
pub use error::IdentityError;
pub use peer::PeerId;
pub use ss58::{AccountCodec, Ss58Codec};
