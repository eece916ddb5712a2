use thiserror::Error;

use tx_codec::CodecError;

/// Key and signing errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("signing degenerate: {0}")]
    SigningDegenerate(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = CryptoError::InvalidPrivateKey("scalar out of range".into());
        assert_eq!(err.to_string(), "invalid private key: scalar out of range");
    }

    #[test]
    fn display_signing_degenerate() {
        let err = CryptoError::SigningDegenerate("zero nonce".into());
        assert_eq!(err.to_string(), "signing degenerate: zero nonce");
    }

    #[test]
    fn codec_errors_pass_through() {
        let err: CryptoError = CodecError::InvalidEncoding("bad wif".into()).into();
        assert_eq!(err.to_string(), "invalid encoding: bad wif");
    }
}
