use thiserror::Error;

use tx_codec::CodecError;
use tx_crypto::CryptoError;

/// Transaction assembly, parsing, and signing errors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("insufficient funds: inputs {inputs} sat below outputs {outputs} sat (short {shortfall} sat)")]
    InsufficientFunds {
        inputs: u64,
        outputs: u64,
        shortfall: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("input index {index} out of range for {count} inputs")]
    InputOutOfRange { index: usize, count: usize },

    #[error("duplicate outpoint {0}")]
    DuplicateOutpoint(String),

    #[error("no funding inputs provided")]
    NoFundingInputs,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
