//! In-memory transaction model and canonical wire (de)serialization.
//!
//! Transaction ids are stored and displayed in the byte order explorers
//! show; serialization reverses them onto the wire. A transaction carrying
//! any non-empty witness stack serializes with the segwit marker and flag
//! bytes, a purely legacy transaction never does.

use tx_codec::varint;
use tx_crypto::hash::sha256d;

use crate::error::BuildError;

/// Sequence value for inputs that opt out of relative locktime.
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Reference to a previous transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction id in display byte order.
    pub txid: [u8; 32],
    /// Output index within that transaction.
    pub vout: u32,
}

impl OutPoint {
    /// Parses the `txid:vout` reference syntax.
    pub fn parse(s: &str) -> Result<OutPoint, BuildError> {
        let (txid_hex, vout_str) = s.rsplit_once(':').ok_or_else(|| {
            BuildError::Serialization(format!("outpoint {s:?} missing ':' separator"))
        })?;

        let txid_bytes = hex::decode(txid_hex)
            .map_err(|e| BuildError::Serialization(format!("outpoint txid: {e}")))?;
        let txid: [u8; 32] = txid_bytes.try_into().map_err(|b: Vec<u8>| {
            BuildError::Serialization(format!("outpoint txid is {} bytes, expected 32", b.len()))
        })?;

        let vout = vout_str
            .parse::<u32>()
            .map_err(|e| BuildError::Serialization(format!("outpoint vout: {e}")))?;

        Ok(OutPoint { txid, vout })
    }

    /// Appends the 36-byte wire form: reversed txid, then vout.
    pub(crate) fn write_into(&self, out: &mut Vec<u8>) {
        out.extend(self.txid.iter().rev());
        out.extend_from_slice(&self.vout.to_le_bytes());
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.vout)
    }
}

/// A transaction input. `script_sig` stays empty for segwit spends; the
/// witness stack is empty until signing attaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub prev_out: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
}

impl TxInput {
    /// An unsigned segwit input spending `prev_out`.
    pub fn new(prev_out: OutPoint, sequence: u32) -> TxInput {
        TxInput {
            prev_out,
            script_sig: Vec::new(),
            sequence,
            witness: Vec::new(),
        }
    }
}

/// A transaction output: value in satoshis plus the locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    /// An output paying `value` satoshis to `address`.
    pub fn paying_to(address: &tx_codec::Address, value: u64) -> TxOutput {
        TxOutput {
            value,
            script_pubkey: address.script_pubkey(),
        }
    }
}

/// An in-memory Bitcoin transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
}

impl Transaction {
    /// Whether any input carries a non-empty witness stack.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Serializes to canonical wire bytes. The segwit marker, flag, and
    /// witness section appear only when `include_witness` is set and some
    /// witness data exists.
    pub fn serialize(&self, include_witness: bool) -> Vec<u8> {
        let with_witness = include_witness && self.has_witness();
        let mut out = Vec::with_capacity(128);

        out.extend_from_slice(&self.version.to_le_bytes());
        if with_witness {
            out.extend_from_slice(&[0x00, 0x01]);
        }

        out.extend(varint::encode(self.inputs.len() as u64));
        for input in &self.inputs {
            input.prev_out.write_into(&mut out);
            out.extend(varint::encode(input.script_sig.len() as u64));
            out.extend_from_slice(&input.script_sig);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        out.extend(varint::encode(self.outputs.len() as u64));
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            out.extend(varint::encode(output.script_pubkey.len() as u64));
            out.extend_from_slice(&output.script_pubkey);
        }

        if with_witness {
            for input in &self.inputs {
                out.extend(varint::encode(input.witness.len() as u64));
                for element in &input.witness {
                    out.extend(varint::encode(element.len() as u64));
                    out.extend_from_slice(element);
                }
            }
        }

        out.extend_from_slice(&self.locktime.to_le_bytes());
        out
    }

    /// Parses canonical wire bytes, with or without a witness section.
    pub fn deserialize(data: &[u8]) -> Result<Transaction, BuildError> {
        let mut reader = Reader { data, pos: 0 };

        let version = i32::from_le_bytes(reader.take_array::<4>("version")?);

        // A zero byte where the input count belongs is the segwit marker;
        // it must be followed by the 0x01 flag.
        let segwit = reader.peek() == Some(0x00);
        if segwit {
            let marker = reader.take_array::<2>("segwit marker and flag")?;
            if marker[1] != 0x01 {
                return Err(BuildError::Serialization(format!(
                    "invalid segwit flag byte {:#04x}",
                    marker[1]
                )));
            }
        }

        let input_count = reader.take_varint()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let mut txid = reader.take_array::<32>("input txid")?;
            txid.reverse();
            let vout = u32::from_le_bytes(reader.take_array::<4>("input vout")?);
            let script_len = reader.take_varint()?;
            let script_sig = reader.take_bytes(script_len as usize, "scriptSig")?.to_vec();
            let sequence = u32::from_le_bytes(reader.take_array::<4>("input sequence")?);
            inputs.push(TxInput {
                prev_out: OutPoint { txid, vout },
                script_sig,
                sequence,
                witness: Vec::new(),
            });
        }

        let output_count = reader.take_varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let value = u64::from_le_bytes(reader.take_array::<8>("output value")?);
            let script_len = reader.take_varint()?;
            let script_pubkey = reader
                .take_bytes(script_len as usize, "scriptPubKey")?
                .to_vec();
            outputs.push(TxOutput {
                value,
                script_pubkey,
            });
        }

        if segwit {
            for input in inputs.iter_mut() {
                let element_count = reader.take_varint()?;
                let mut witness = Vec::new();
                for _ in 0..element_count {
                    let element_len = reader.take_varint()?;
                    witness.push(
                        reader
                            .take_bytes(element_len as usize, "witness element")?
                            .to_vec(),
                    );
                }
                input.witness = witness;
            }
        }

        let locktime = u32::from_le_bytes(reader.take_array::<4>("locktime")?);

        if reader.pos != data.len() {
            return Err(BuildError::Serialization(format!(
                "{} trailing bytes after locktime",
                data.len() - reader.pos
            )));
        }

        Ok(Transaction {
            version,
            inputs,
            outputs,
            locktime,
        })
    }

    /// Parses a lowercase or uppercase hex string.
    pub fn from_hex(s: &str) -> Result<Transaction, BuildError> {
        let bytes =
            hex::decode(s).map_err(|e| BuildError::Serialization(format!("transaction hex: {e}")))?;
        Transaction::deserialize(&bytes)
    }

    /// Full serialization (witness included when present) as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize(true))
    }

    /// Transaction id in display byte order: the reversed double-SHA256 of
    /// the witness-stripped serialization.
    pub fn txid(&self) -> [u8; 32] {
        let mut id = sha256d(&self.serialize(false));
        id.reverse();
        id
    }

    /// Transaction id as the hex string explorers display.
    pub fn txid_hex(&self) -> String {
        hex::encode(self.txid())
    }

    /// Sum of all output values in satoshis.
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|output| output.value).sum()
    }

    /// All input outpoints concatenated in wire form, in input order.
    /// Feeds the BIP143 hashPrevouts digest; not a slice of the full
    /// serialization.
    pub(crate) fn prevouts_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(36 * self.inputs.len());
        for input in &self.inputs {
            input.prev_out.write_into(&mut out);
        }
        out
    }

    /// All input sequences concatenated little-endian, in input order.
    pub(crate) fn sequences_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 * self.inputs.len());
        for input in &self.inputs {
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }
        out
    }

    /// All outputs concatenated in wire form.
    pub(crate) fn outputs_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            out.extend(varint::encode(output.script_pubkey.len() as u64));
            out.extend_from_slice(&output.script_pubkey);
        }
        out
    }
}

/// Byte-slice reader tracking the parse position.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn take_bytes(&mut self, len: usize, field: &str) -> Result<&'a [u8], BuildError> {
        let data = self.data;
        let end = self.pos.checked_add(len).ok_or_else(|| {
            BuildError::Serialization(format!("{field} length overflows"))
        })?;
        let bytes = data.get(self.pos..end).ok_or_else(|| {
            BuildError::Serialization(format!(
                "{field} needs {len} bytes, {} remain",
                data.len() - self.pos
            ))
        })?;
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], BuildError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take_bytes(N, field)?);
        Ok(out)
    }

    fn take_varint(&mut self) -> Result<u64, BuildError> {
        let (value, consumed) = varint::decode(self.data, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }
}
