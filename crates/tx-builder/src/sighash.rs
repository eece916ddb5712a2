//! BIP143 sighash computation for segwit version-0 inputs.
//!
//! Supports SIGHASH_ALL and SIGHASH_ALL|ANYONECANPAY. Under ANYONECANPAY
//! the hashPrevouts and hashSequence fields are 32 zero bytes; the signed
//! input's own outpoint is still committed by the preimage's outpoint
//! field, and hashOutputs covers the complete output set either way.

use tx_crypto::hash::sha256d;

pub use tx_crypto::ecdsa::SighashType;

use crate::error::BuildError;
use crate::transaction::Transaction;

/// scriptCode for spending a P2WPKH output: the length-prefixed
/// P2PKH-equivalent script over the 20-byte public key hash.
pub fn p2wpkh_script_code(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut code = Vec::with_capacity(26);
    code.extend_from_slice(&[0x19, 0x76, 0xa9, 0x14]);
    code.extend_from_slice(pubkey_hash);
    code.extend_from_slice(&[0x88, 0xac]);
    code
}

/// Memoized midstate digests for one transaction.
///
/// hashPrevouts, hashSequence, and hashOutputs do not depend on which input
/// is being signed, so one cache serves every signing pass over a
/// transaction. The cached values are stale if the transaction's inputs or
/// outputs change; use a fresh cache per assembled transaction.
#[derive(Debug, Default)]
pub struct SighashCache {
    hash_prevouts: Option<[u8; 32]>,
    hash_sequence: Option<[u8; 32]>,
    hash_outputs: Option<[u8; 32]>,
}

impl SighashCache {
    pub fn new() -> SighashCache {
        SighashCache::default()
    }

    fn hash_prevouts(&mut self, tx: &Transaction) -> [u8; 32] {
        *self
            .hash_prevouts
            .get_or_insert_with(|| sha256d(&tx.prevouts_bytes()))
    }

    fn hash_sequence(&mut self, tx: &Transaction) -> [u8; 32] {
        *self
            .hash_sequence
            .get_or_insert_with(|| sha256d(&tx.sequences_bytes()))
    }

    fn hash_outputs(&mut self, tx: &Transaction) -> [u8; 32] {
        *self
            .hash_outputs
            .get_or_insert_with(|| sha256d(&tx.outputs_bytes()))
    }
}

/// Assembles the BIP143 preimage for one input.
///
/// `value` is the satoshi amount of the output being spent and
/// `script_code` the length-prefixed script committed for it.
pub fn bip143_preimage(
    tx: &Transaction,
    input_index: usize,
    value: u64,
    script_code: &[u8],
    sighash_type: SighashType,
    cache: &mut SighashCache,
) -> Result<Vec<u8>, BuildError> {
    let input = tx.inputs.get(input_index).ok_or(BuildError::InputOutOfRange {
        index: input_index,
        count: tx.inputs.len(),
    })?;

    let mut preimage = Vec::with_capacity(156 + script_code.len());

    preimage.extend_from_slice(&tx.version.to_le_bytes());

    if sighash_type.anyone_can_pay() {
        preimage.extend_from_slice(&[0u8; 32]);
        preimage.extend_from_slice(&[0u8; 32]);
    } else {
        preimage.extend_from_slice(&cache.hash_prevouts(tx));
        preimage.extend_from_slice(&cache.hash_sequence(tx));
    }

    input.prev_out.write_into(&mut preimage);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&value.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&cache.hash_outputs(tx));
    preimage.extend_from_slice(&tx.locktime.to_le_bytes());
    preimage.extend_from_slice(&sighash_type.le_bytes());

    Ok(preimage)
}

/// The 32-byte digest a signature for `input_index` commits to.
pub fn bip143_sighash(
    tx: &Transaction,
    input_index: usize,
    value: u64,
    script_code: &[u8],
    sighash_type: SighashType,
    cache: &mut SighashCache,
) -> Result<[u8; 32], BuildError> {
    let preimage = bip143_preimage(tx, input_index, value, script_code, sighash_type, cache)?;
    Ok(sha256d(&preimage))
}
