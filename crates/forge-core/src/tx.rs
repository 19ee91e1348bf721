//! Transaction model, consensus serialization, identifiers and weight.

use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::{compact_size_len, write_compact_size, ByteReader};
use crate::error::DecodeError;
use crate::hash::{double_sha256, hash_to_display_hex, reverse_bytes};

/// Output type tag carried by a prevout view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    P2pkh,
    P2wpkh,
    P2sh,
    P2wsh,
    P2tr,
}

impl ScriptType {
    /// Map a `scriptpubkey_type` tag. The witness types also appear with
    /// their version-prefixed spellings (`v0_p2wpkh`, `v1_p2tr`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p2pkh" => Some(ScriptType::P2pkh),
            "p2wpkh" | "v0_p2wpkh" => Some(ScriptType::P2wpkh),
            "p2sh" => Some(ScriptType::P2sh),
            "p2wsh" | "v0_p2wsh" => Some(ScriptType::P2wsh),
            "p2tr" | "v1_p2tr" => Some(ScriptType::P2tr),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::P2sh => "p2sh",
            ScriptType::P2wsh => "p2wsh",
            ScriptType::P2tr => "p2tr",
        }
    }
}

/// The referenced output an input spends. Supplied by the input record
/// itself; there is no UTXO database behind the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prevout {
    /// Value in satoshis.
    pub value: u64,
    /// The scriptPubKey being satisfied.
    pub script_pubkey: Vec<u8>,
    /// Declared output type.
    pub script_type: ScriptType,
}

/// One transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Referenced txid in display order (as named on disk); serialization
    /// reverses it into wire order.
    pub prev_txid: [u8; 32],
    /// Referenced output index.
    pub vout: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    /// Witness stack items; empty for non-witness inputs.
    pub witness: Vec<Vec<u8>>,
    /// Prevout view; absent only for transactions decoded from raw bytes.
    pub prevout: Option<Prevout>,
}

/// One transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis.
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// An in-memory transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub locktime: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// A transaction is SegWit iff any input carries a non-empty witness.
    pub fn is_segwit(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Serialize without witness data. This form feeds the txid and the
    /// legacy signature hash, and its length is the "stripped" size.
    pub fn serialize_legacy(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.base_size_estimate());
        self.write_body(&mut buf, false);
        buf
    }

    /// Serialize in full wire form. A SegWit transaction gets the marker
    /// and flag bytes plus one witness stack per input; a transaction with
    /// no witnesses serializes identically to the legacy form.
    pub fn serialize_full(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.base_size_estimate() + self.witness_size());
        self.write_body(&mut buf, self.is_segwit());
        buf
    }

    fn write_body(&self, buf: &mut Vec<u8>, with_witness: bool) {
        buf.extend_from_slice(&self.version.to_le_bytes());

        if with_witness {
            buf.push(0x00); // marker
            buf.push(0x01); // flag
        }

        write_compact_size(buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(&reverse_bytes(&input.prev_txid));
            buf.extend_from_slice(&input.vout.to_le_bytes());
            write_compact_size(buf, input.script_sig.len() as u64);
            buf.extend_from_slice(&input.script_sig);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_compact_size(buf, output.script_pubkey.len() as u64);
            buf.extend_from_slice(&output.script_pubkey);
        }

        if with_witness {
            for input in &self.inputs {
                write_compact_size(buf, input.witness.len() as u64);
                for item in &input.witness {
                    write_compact_size(buf, item.len() as u64);
                    buf.extend_from_slice(item);
                }
            }
        }

        buf.extend_from_slice(&self.locktime.to_le_bytes());
    }

    fn base_size_estimate(&self) -> usize {
        let mut size = 4 + compact_size_len(self.inputs.len() as u64);
        for input in &self.inputs {
            size += 32 + 4 + compact_size_len(input.script_sig.len() as u64);
            size += input.script_sig.len() + 4;
        }
        size += compact_size_len(self.outputs.len() as u64);
        for output in &self.outputs {
            size += 8 + compact_size_len(output.script_pubkey.len() as u64);
            size += output.script_pubkey.len();
        }
        size + 4
    }

    fn witness_size(&self) -> usize {
        let mut size = 2; // marker + flag
        for input in &self.inputs {
            size += compact_size_len(input.witness.len() as u64);
            for item in &input.witness {
                size += compact_size_len(item.len() as u64) + item.len();
            }
        }
        size
    }

    /// Transaction identifier, internal byte order.
    ///
    /// Render with [`hash_to_display_hex`] to get the filename form.
    pub fn txid(&self) -> [u8; 32] {
        double_sha256(&self.serialize_legacy())
    }

    /// Witness identifier, internal byte order. Equals [`Self::txid`] for
    /// a transaction with no witness data.
    pub fn wtxid(&self) -> [u8; 32] {
        if self.is_segwit() {
            double_sha256(&self.serialize_full())
        } else {
            self.txid()
        }
    }

    pub fn txid_hex(&self) -> String {
        hash_to_display_hex(&self.txid())
    }

    pub fn wtxid_hex(&self) -> String {
        hash_to_display_hex(&self.wtxid())
    }

    /// Size of the full wire serialization in bytes.
    pub fn total_size(&self) -> usize {
        self.serialize_full().len()
    }

    /// Size of the witness-stripped serialization in bytes.
    pub fn stripped_size(&self) -> usize {
        self.serialize_legacy().len()
    }

    /// Block weight: witness bytes count once, base bytes four times.
    pub fn weight(&self) -> u64 {
        3 * self.stripped_size() as u64 + self.total_size() as u64
    }

    /// Virtual size: weight divided by four, rounded up.
    pub fn vsize(&self) -> u64 {
        (self.weight() + 3) / 4
    }

    /// Concatenated wire-order outpoints of every input.
    pub fn serialize_all_outpoints(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.inputs.len() * 36);
        for input in &self.inputs {
            buf.extend_from_slice(&reverse_bytes(&input.prev_txid));
            buf.extend_from_slice(&input.vout.to_le_bytes());
        }
        buf
    }

    /// Concatenated sequence fields of every input.
    pub fn serialize_all_sequences(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.inputs.len() * 4);
        for input in &self.inputs {
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        buf
    }

    /// Concatenated serialized outputs.
    pub fn serialize_all_outputs(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_compact_size(&mut buf, output.script_pubkey.len() as u64);
            buf.extend_from_slice(&output.script_pubkey);
        }
        buf
    }

    /// Decode a transaction from its wire serialization (either form).
    ///
    /// Decoded inputs carry no prevout view; only the fields present on
    /// the wire can be recovered.
    pub fn decode(bytes: &[u8]) -> Result<Transaction, DecodeError> {
        let mut reader = ByteReader::new(bytes);

        let version = reader.read_i32_le()?;

        let mut count = reader.read_length()?;
        let segwit = count == 0;
        if segwit {
            let flag = reader.read_u8()?;
            if flag != 0x01 {
                return Err(DecodeError::BadWitnessFlag(flag));
            }
            count = reader.read_length()?;
        }

        let mut inputs = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let wire_txid = reader.read_array_32()?;
            inputs.push(TxInput {
                prev_txid: reverse_bytes(&wire_txid),
                vout: reader.read_u32_le()?,
                script_sig: reader.read_var_bytes()?,
                sequence: reader.read_u32_le()?,
                witness: Vec::new(),
                prevout: None,
            });
        }

        let count = reader.read_length()?;
        let mut outputs = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            outputs.push(TxOutput {
                value: reader.read_u64_le()?,
                script_pubkey: reader.read_var_bytes()?,
            });
        }

        if segwit {
            for input in &mut inputs {
                let items = reader.read_length()?;
                let mut witness = Vec::with_capacity(items.min(64));
                for _ in 0..items {
                    witness.push(reader.read_var_bytes()?);
                }
                input.witness = witness;
            }
        }

        let locktime = reader.read_u32_le()?;
        reader.finish()?;

        Ok(Transaction {
            version,
            locktime,
            inputs,
            outputs,
        })
    }
}
