//! Deterministic ECDSA signing over secp256k1.
//!
//! `Secp256k1Signer` is the one signing backend: RFC 6979 nonces and
//! constant-time scalar arithmetic via `k256`. Signatures are low-S
//! normalized before they leave this module and DER-encoded for witness
//! data with the sighash-type byte appended.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::error::CryptoError;
use crate::keys::KeyPair;

/// Sighash flag committed by a signature and appended to its DER encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashType {
    /// SIGHASH_ALL: commits to all inputs and all outputs.
    All,
    /// SIGHASH_ALL | SIGHASH_ANYONECANPAY: commits to the signer's own
    /// input and all outputs; other inputs may be added later.
    AllAnyoneCanPay,
}

impl SighashType {
    /// The flag byte appended to the DER signature.
    pub fn as_byte(self) -> u8 {
        match self {
            SighashType::All => 0x01,
            SighashType::AllAnyoneCanPay => 0x81,
        }
    }

    /// Whether other inputs are left uncommitted.
    pub fn anyone_can_pay(self) -> bool {
        matches!(self, SighashType::AllAnyoneCanPay)
    }

    /// The 4-byte little-endian form used in the BIP143 preimage.
    pub fn le_bytes(self) -> [u8; 4] {
        u32::from(self.as_byte()).to_le_bytes()
    }
}

/// A low-S-normalized ECDSA signature.
#[derive(Debug, Clone)]
pub struct EcdsaSignature {
    inner: Signature,
}

impl EcdsaSignature {
    fn from_k256(signature: Signature) -> EcdsaSignature {
        let inner = signature.normalize_s().unwrap_or(signature);
        EcdsaSignature { inner }
    }

    /// Whether s ≤ n/2. Holds for every signature this module produces.
    pub fn is_low_s(&self) -> bool {
        self.inner.normalize_s().is_none()
    }

    /// The 64-byte compact form (r ‖ s, big-endian).
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// DER encoding: minimal-length big-endian integers wrapped as
    /// `0x30 len 0x02 len(r) r 0x02 len(s) s`.
    pub fn to_der(&self) -> Vec<u8> {
        self.inner.to_der().as_bytes().to_vec()
    }

    /// The witness element form: DER bytes plus the sighash-type byte.
    pub fn to_witness_element(&self, sighash_type: SighashType) -> Vec<u8> {
        let mut element = self.to_der();
        element.push(sighash_type.as_byte());
        element
    }
}

/// Signs 32-byte transaction digests.
///
/// The seam exists so an alternative audited backend can be substituted
/// without touching the sighash computation it signs.
pub trait SighashSigner {
    fn sign(&self, sighash: &[u8; 32], key: &KeyPair) -> Result<EcdsaSignature, CryptoError>;
}

/// RFC 6979 deterministic signer backed by `k256`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Signer;

impl SighashSigner for Secp256k1Signer {
    fn sign(&self, sighash: &[u8; 32], key: &KeyPair) -> Result<EcdsaSignature, CryptoError> {
        let signing_key = SigningKey::from_bytes(key.secret_bytes().into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

        let signature: Signature = signing_key
            .sign_prehash(sighash)
            .map_err(|e| CryptoError::SigningDegenerate(e.to_string()))?;

        Ok(EcdsaSignature::from_k256(signature))
    }
}

/// Verifies a signature over a 32-byte digest against a compressed public
/// key. `Ok(false)` means a well-formed signature that does not verify.
pub fn verify_prehash(
    sighash: &[u8; 32],
    signature: &EcdsaSignature,
    public_key: &[u8; 33],
) -> Result<bool, CryptoError> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    Ok(verifying_key.verify_prehash(sighash, &signature.inner).is_ok())
}
