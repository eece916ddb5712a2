//! Transaction assembly, BIP143 sighash computation, and signing
//! orchestration.
//!
//! Turns funding inputs (locally signable P2WPKH, or carrying a witness
//! produced elsewhere) plus a frozen output set into fully signed
//! transaction hex ready for broadcast.

pub mod builder;
pub mod error;
pub mod sighash;
pub mod transaction;

pub use builder::{
    assemble, build_and_sign, estimate_fee, sign, sign_raw_transaction, FundingInput,
    FundingSource,
};
pub use error::BuildError;
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput};
