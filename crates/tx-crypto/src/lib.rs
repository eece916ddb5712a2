//! Key handling and ECDSA signing for the transaction engine.
//!
//! Wraps the `k256` secp256k1 implementation: compressed public key
//! derivation, WIF decoding, RFC 6979 deterministic signing with low-S
//! normalization, and DER signature encoding for witness data.

pub mod ecdsa;
pub mod error;
pub mod hash;
pub mod keys;

pub use ecdsa::{EcdsaSignature, Secp256k1Signer, SighashSigner, SighashType};
pub use error::CryptoError;
pub use keys::KeyPair;
