//! Orchestrates assembly and signing of a complete transaction.
//!
//! Outputs are frozen at assembly: SIGHASH_ALL binds every signature to the
//! full output set through hashOutputs, so changing an output afterwards
//! would invalidate signatures already produced. Foreign witnesses are
//! attached verbatim; a stack signed with SIGHASH_ALL|ANYONECANPAY stays
//! valid when sibling inputs are added, as long as the outputs are
//! unchanged.

use std::collections::HashSet;

use tx_crypto::ecdsa::{EcdsaSignature, Secp256k1Signer, SighashSigner, SighashType};
use tx_crypto::KeyPair;

use crate::error::BuildError;
use crate::sighash::{bip143_sighash, p2wpkh_script_code, SighashCache};
use crate::transaction::{OutPoint, Transaction, TxInput, TxOutput, DEFAULT_SEQUENCE};

/// Transaction version emitted by the builder.
pub const DEFAULT_VERSION: i32 = 2;

/// Estimated virtual size of a P2WPKH input (in vbytes).
/// Breakdown: 41 bytes non-witness + ~27 witness bytes / 4 = ~68 vbytes.
const P2WPKH_INPUT_VBYTES: u64 = 68;

/// Estimated virtual size of any output (in vbytes).
const OUTPUT_VBYTES: u64 = 31;

/// Fixed transaction overhead (in vbytes): version + locktime + segwit
/// marker/flag + counts.
const TX_OVERHEAD_VBYTES: u64 = 11;

/// How the witness for a funding input is produced.
#[derive(Debug, Clone)]
pub enum FundingSource {
    /// Signed locally with this key; the witness becomes
    /// `[DER signature ‖ sighash byte, compressed pubkey]`.
    Local(KeyPair),
    /// Witness produced elsewhere (e.g. a taproot script-path reveal signed
    /// with SIGHASH_ALL|ANYONECANPAY) and attached verbatim.
    Foreign(Vec<Vec<u8>>),
}

/// One UTXO funding the transaction.
#[derive(Debug, Clone)]
pub struct FundingInput {
    pub outpoint: OutPoint,
    /// Value of the spent output in satoshis.
    pub value: u64,
    pub sequence: u32,
    pub source: FundingSource,
}

impl FundingInput {
    /// A locally signable P2WPKH input.
    pub fn local(outpoint: OutPoint, value: u64, key: KeyPair) -> FundingInput {
        FundingInput {
            outpoint,
            value,
            sequence: DEFAULT_SEQUENCE,
            source: FundingSource::Local(key),
        }
    }

    /// An input whose witness was produced elsewhere.
    pub fn foreign(outpoint: OutPoint, value: u64, witness: Vec<Vec<u8>>) -> FundingInput {
        FundingInput {
            outpoint,
            value,
            sequence: DEFAULT_SEQUENCE,
            source: FundingSource::Foreign(witness),
        }
    }
}

/// Per-input signing progress. Terminal state is `WitnessAttached`;
/// foreign-witness inputs enter there directly.
enum SigningState {
    Unsigned,
    SighashComputed([u8; 32]),
    Signed(EcdsaSignature),
    WitnessAttached(Vec<Vec<u8>>),
}

/// An assembled transaction whose witnesses are not yet attached.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    tx: Transaction,
    funding: Vec<FundingInput>,
}

impl UnsignedTransaction {
    /// The transaction skeleton (empty witnesses).
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// `sum(input values) − sum(output values)`, the fee the transaction
    /// leaves for miners.
    pub fn implied_fee(&self) -> u64 {
        let inputs: u64 = self.funding.iter().map(|f| f.value).sum();
        inputs - self.tx.total_output_value()
    }
}

/// Estimate the fee for a P2WPKH transaction.
///
/// Computes `estimated_vsize * fee_rate_sat_vbyte` where the vsize is
/// derived from the number of inputs and outputs using P2WPKH weight
/// estimates.
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, fee_rate_sat_vbyte: u64) -> u64 {
    let vsize = TX_OVERHEAD_VBYTES
        + (num_inputs as u64 * P2WPKH_INPUT_VBYTES)
        + (num_outputs as u64 * OUTPUT_VBYTES);
    vsize * fee_rate_sat_vbyte
}

/// Assembles the transaction skeleton and freezes its outputs.
///
/// Rejects duplicate outpoints and funding below the output total; the
/// `InsufficientFunds` error reports the exact shortfall.
pub fn assemble(
    funding: Vec<FundingInput>,
    outputs: Vec<TxOutput>,
    version: i32,
    locktime: u32,
) -> Result<UnsignedTransaction, BuildError> {
    if funding.is_empty() {
        return Err(BuildError::NoFundingInputs);
    }

    let mut seen = HashSet::new();
    for input in &funding {
        if !seen.insert(input.outpoint) {
            return Err(BuildError::DuplicateOutpoint(input.outpoint.to_string()));
        }
    }

    let input_total: u64 = funding.iter().map(|f| f.value).sum();
    let output_total: u64 = outputs.iter().map(|o| o.value).sum();
    if input_total < output_total {
        return Err(BuildError::InsufficientFunds {
            inputs: input_total,
            outputs: output_total,
            shortfall: output_total - input_total,
        });
    }

    let tx = Transaction {
        version,
        inputs: funding
            .iter()
            .map(|f| TxInput::new(f.outpoint, f.sequence))
            .collect(),
        outputs,
        locktime,
    };

    Ok(UnsignedTransaction { tx, funding })
}

/// Attaches every witness and returns the finished transaction.
pub fn sign<S: SighashSigner>(
    unsigned: UnsignedTransaction,
    signer: &S,
) -> Result<Transaction, BuildError> {
    let UnsignedTransaction { mut tx, funding } = unsigned;
    let mut cache = SighashCache::new();

    for (index, input) in funding.iter().enumerate() {
        let witness = match &input.source {
            FundingSource::Foreign(stack) => stack.clone(),
            FundingSource::Local(key) => {
                sign_local_input(&tx, index, input.value, key, signer, &mut cache)?
            }
        };
        tx.inputs[index].witness = witness;
    }

    Ok(tx)
}

/// Drives one locally signed input through the signing states.
fn sign_local_input<S: SighashSigner>(
    tx: &Transaction,
    index: usize,
    value: u64,
    key: &KeyPair,
    signer: &S,
    cache: &mut SighashCache,
) -> Result<Vec<Vec<u8>>, BuildError> {
    let mut state = SigningState::Unsigned;
    loop {
        state = match state {
            SigningState::Unsigned => {
                let script_code = p2wpkh_script_code(&key.public_key_hash());
                let sighash =
                    bip143_sighash(tx, index, value, &script_code, SighashType::All, cache)?;
                SigningState::SighashComputed(sighash)
            }
            SigningState::SighashComputed(sighash) => {
                SigningState::Signed(signer.sign(&sighash, key)?)
            }
            SigningState::Signed(signature) => SigningState::WitnessAttached(vec![
                signature.to_witness_element(SighashType::All),
                key.public_key().to_vec(),
            ]),
            SigningState::WitnessAttached(witness) => return Ok(witness),
        };
    }
}

/// Assembles, signs with the default signer, and serializes to hex.
pub fn build_and_sign(
    funding: Vec<FundingInput>,
    outputs: Vec<TxOutput>,
) -> Result<String, BuildError> {
    let unsigned = assemble(funding, outputs, DEFAULT_VERSION, 0)?;
    let tx = sign(unsigned, &Secp256k1Signer)?;
    Ok(tx.to_hex())
}

/// Signs one P2WPKH input of an externally assembled transaction.
///
/// Parses the canonical wire hex, computes the SIGHASH_ALL digest for
/// `input_index` against `prev_value`, signs with the WIF key, attaches the
/// two-element witness, and returns the re-serialized hex. Witnesses of the
/// other inputs are left as parsed.
pub fn sign_raw_transaction(
    tx_hex: &str,
    input_index: usize,
    prev_value: u64,
    wif: &str,
) -> Result<String, BuildError> {
    let mut tx = Transaction::from_hex(tx_hex)?;
    if input_index >= tx.inputs.len() {
        return Err(BuildError::InputOutOfRange {
            index: input_index,
            count: tx.inputs.len(),
        });
    }

    let (key, _network) = KeyPair::from_wif(wif)?;
    let script_code = p2wpkh_script_code(&key.public_key_hash());
    let mut cache = SighashCache::new();
    let sighash = bip143_sighash(
        &tx,
        input_index,
        prev_value,
        &script_code,
        SighashType::All,
        &mut cache,
    )?;

    let signature = Secp256k1Signer.sign(&sighash, &key)?;
    tx.inputs[input_index].witness = vec![
        signature.to_witness_element(SighashType::All),
        key.public_key().to_vec(),
    ];

    Ok(tx.to_hex())
}
