use thiserror::Error;

/// Codec failures for varint, Base58Check, and Bech32 data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_checksum_mismatch() {
        let err = CodecError::ChecksumMismatch {
            expected: "aabbccdd".into(),
            found: "11223344".into(),
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: expected aabbccdd, found 11223344"
        );
    }

    #[test]
    fn display_invalid_encoding() {
        let err = CodecError::InvalidEncoding("truncated varint".into());
        assert_eq!(err.to_string(), "invalid encoding: truncated varint");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(CodecError::InvalidEncoding("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
