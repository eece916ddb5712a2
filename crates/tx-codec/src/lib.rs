//! Wire-level codecs for Bitcoin transactions and addresses.
//!
//! Provides varint encoding, Base58Check, Bech32/Bech32m, and an `Address`
//! type that parses both text forms and renders the matching scriptPubKey.

pub mod address;
pub mod base58;
pub mod bech32;
pub mod error;
pub mod varint;

pub use address::{Address, Network};
pub use error::CodecError;
