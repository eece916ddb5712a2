//! secp256k1 key pairs and WIF import/export.

use k256::ecdsa::SigningKey;
use zeroize::Zeroize;

use tx_codec::{base58, Address, Network};

use crate::error::CryptoError;
use crate::hash::hash160;

/// A secp256k1 private key with its compressed public key.
///
/// The secret scalar is validated on construction (non-zero, below the curve
/// order) and wiped when the pair is dropped.
#[derive(Clone)]
pub struct KeyPair {
    secret: [u8; 32],
    public: [u8; 33],
}

impl KeyPair {
    /// Builds a key pair from a raw 32-byte scalar.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Result<KeyPair, CryptoError> {
        let signing_key = SigningKey::from_bytes(secret.into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

        let public: [u8; 33] = signing_key
            .verifying_key()
            .to_sec1_bytes()
            .as_ref()
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey("unexpected point encoding".into()))?;

        Ok(KeyPair {
            secret: *secret,
            public,
        })
    }

    /// Decodes a WIF private key, returning the pair and its network.
    ///
    /// Only compressed-key WIF is accepted: a P2WPKH witness commits to the
    /// hash of the compressed public key.
    pub fn from_wif(wif: &str) -> Result<(KeyPair, Network), CryptoError> {
        let payload = base58::check_decode(wif)?;

        let network = payload
            .first()
            .and_then(|&prefix| Network::from_wif_prefix(prefix))
            .ok_or_else(|| {
                CryptoError::InvalidPrivateKey("unknown WIF version byte".into())
            })?;

        match payload.len() {
            34 if payload[33] == 0x01 => {}
            34 => {
                return Err(CryptoError::InvalidPrivateKey(format!(
                    "unexpected WIF suffix byte {:#04x}",
                    payload[33]
                )))
            }
            33 => {
                return Err(CryptoError::InvalidPrivateKey(
                    "uncompressed WIF key cannot sign segwit inputs".into(),
                ))
            }
            len => {
                return Err(CryptoError::InvalidPrivateKey(format!(
                    "WIF payload is {len} bytes, expected 34"
                )))
            }
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&payload[1..33]);
        let pair = KeyPair::from_secret_bytes(&secret);
        secret.zeroize();

        Ok((pair?, network))
    }

    /// Encodes the private key as compressed-key WIF for `network`.
    pub fn to_wif(&self, network: Network) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(network.wif_prefix());
        payload.extend_from_slice(&self.secret);
        payload.push(0x01);
        let wif = base58::check_encode(&payload);
        payload.zeroize();
        wif
    }

    /// The raw secret scalar.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }

    /// The 33-byte compressed public key.
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public
    }

    /// hash160 of the compressed public key.
    pub fn public_key_hash(&self) -> [u8; 20] {
        hash160(&self.public)
    }

    /// The segwit-v0 address paying to this key.
    pub fn p2wpkh_address(&self, network: Network) -> Address {
        Address::p2wpkh(self.public_key_hash(), network)
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public))
            .finish_non_exhaustive()
    }
}
