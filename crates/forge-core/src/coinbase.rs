//! Coinbase transaction synthesis.
//!
//! The coinbase spends the null outpoint, carries the BIP34 block height
//! in its scriptSig, and pays the fee reward plus subsidy to the miner's
//! script. Its second output carries the witness commitment binding the
//! block to the included wtxid set.

use alloc::vec::Vec;

use crate::codec::write_compact_size;
use crate::hash::double_sha256;
use crate::merkle::{compute_witness_commitment, witness_commitment_script};

/// Reserved value carried as the coinbase's single witness item.
pub const WITNESS_RESERVED_VALUE: [u8; 32] = [0u8; 32];

/// Builder for the block's coinbase transaction.
pub struct CoinbaseBuilder {
    /// The block height (required by BIP34).
    block_height: u32,
    /// scriptPubKey receiving the reward.
    payout_script: Vec<u8>,
    /// Extra nonce data for merkle root variation (8 bytes).
    extra_nonce: [u8; 8],
    /// Witness reserved value committed alongside the wtxid root.
    witness_reserved: [u8; 32],
}

impl CoinbaseBuilder {
    pub fn new(block_height: u32, payout_script: Vec<u8>) -> Self {
        CoinbaseBuilder {
            block_height,
            payout_script,
            extra_nonce: [0u8; 8],
            witness_reserved: WITNESS_RESERVED_VALUE,
        }
    }

    /// Set the extra nonce (used to vary the merkle root).
    pub fn with_extra_nonce(mut self, extra_nonce: [u8; 8]) -> Self {
        self.extra_nonce = extra_nonce;
        self
    }

    /// Build the coinbase for a block whose wtxid merkle root is
    /// `wtxid_root`, paying `reward` satoshis to the payout script.
    pub fn build(&self, reward: u64, wtxid_root: &[u8; 32]) -> CoinbaseTransaction {
        let script_sig = self.build_script_sig();

        let commitment = compute_witness_commitment(wtxid_root, &self.witness_reserved);
        let outputs = [
            (reward, self.payout_script.clone()),
            (0, witness_commitment_script(&commitment)),
        ];

        let (raw_tx, raw_tx_with_witness) = self.serialize_transaction(&script_sig, &outputs);
        let txid = double_sha256(&raw_tx);

        CoinbaseTransaction {
            raw_tx,
            raw_tx_with_witness,
            txid,
            // the coinbase wtxid is defined as all zeros
            wtxid: [0u8; 32],
        }
    }

    /// scriptSig layout: [height push] [height bytes] [extra nonce].
    fn build_script_sig(&self) -> Vec<u8> {
        let mut script_sig = Vec::with_capacity(16);

        let height_bytes = encode_block_height(self.block_height);
        script_sig.push(height_bytes.len() as u8);
        script_sig.extend_from_slice(&height_bytes);
        script_sig.extend_from_slice(&self.extra_nonce);

        script_sig
    }

    /// Serialize the transaction with and without witness data.
    fn serialize_transaction(
        &self,
        script_sig: &[u8],
        outputs: &[(u64, Vec<u8>)],
    ) -> (Vec<u8>, Vec<u8>) {
        // Non-witness serialization (for txid)
        let mut raw_tx = Vec::with_capacity(200);
        raw_tx.extend_from_slice(&2u32.to_le_bytes());
        self.write_body(&mut raw_tx, script_sig, outputs);
        raw_tx.extend_from_slice(&0u32.to_le_bytes());

        // Witness serialization (for the block artifact)
        let mut raw_tx_with_witness = Vec::with_capacity(300);
        raw_tx_with_witness.extend_from_slice(&2u32.to_le_bytes());
        raw_tx_with_witness.push(0x00); // marker
        raw_tx_with_witness.push(0x01); // flag
        self.write_body(&mut raw_tx_with_witness, script_sig, outputs);

        // Exactly one witness stack with one 32-byte item
        raw_tx_with_witness.push(0x01);
        raw_tx_with_witness.push(0x20);
        raw_tx_with_witness.extend_from_slice(&self.witness_reserved);

        raw_tx_with_witness.extend_from_slice(&0u32.to_le_bytes());

        (raw_tx, raw_tx_with_witness)
    }

    /// Input and output sections, shared by both serializations.
    fn write_body(&self, buf: &mut Vec<u8>, script_sig: &[u8], outputs: &[(u64, Vec<u8>)]) {
        // single input spending the null outpoint
        buf.push(0x01);
        buf.extend_from_slice(&[0u8; 32]);
        buf.extend_from_slice(&0xFFFFFFFFu32.to_le_bytes());
        write_compact_size(buf, script_sig.len() as u64);
        buf.extend_from_slice(script_sig);
        buf.extend_from_slice(&0xFFFFFFFFu32.to_le_bytes());

        write_compact_size(buf, outputs.len() as u64);
        for (value, script_pubkey) in outputs {
            buf.extend_from_slice(&value.to_le_bytes());
            write_compact_size(buf, script_pubkey.len() as u64);
            buf.extend_from_slice(script_pubkey);
        }
    }
}

/// A constructed coinbase transaction.
#[derive(Debug, Clone)]
pub struct CoinbaseTransaction {
    /// Raw transaction without witness (used for txid calculation).
    pub raw_tx: Vec<u8>,
    /// Raw transaction with witness (emitted in the block artifact).
    pub raw_tx_with_witness: Vec<u8>,
    /// Transaction ID, internal byte order.
    pub txid: [u8; 32],
    /// Witness transaction ID (all zeros for the coinbase).
    pub wtxid: [u8; 32],
}

impl CoinbaseTransaction {
    /// Block weight of the coinbase.
    pub fn weight(&self) -> u64 {
        3 * self.raw_tx.len() as u64 + self.raw_tx_with_witness.len() as u64
    }
}

/// Encode a block height per BIP34: minimal little-endian with a padding
/// byte when the top bit would read as a sign.
fn encode_block_height(height: u32) -> Vec<u8> {
    if height == 0 {
        return Vec::new();
    }

    let mut bytes = Vec::new();
    let mut n = height;
    while n > 0 {
        bytes.push((n & 0xFF) as u8);
        n >>= 8;
    }

    if let Some(&last) = bytes.last() {
        if last & 0x80 != 0 {
            bytes.push(0x00);
        }
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::merkle_root;
    use crate::params::DEFAULT_PAYOUT_SCRIPT;
    use crate::tx::Transaction;
    use alloc::vec;

    #[test]
    fn test_encode_block_height() {
        assert_eq!(encode_block_height(0), Vec::<u8>::new());
        assert_eq!(encode_block_height(1), vec![0x01]);
        assert_eq!(encode_block_height(127), vec![0x7f]);
        // 0x80 needs padding to avoid reading as negative
        assert_eq!(encode_block_height(128), vec![0x80, 0x00]);
        assert_eq!(encode_block_height(256), vec![0x00, 0x01]);
        // 840000 = 0x0cd140
        assert_eq!(encode_block_height(840_000), vec![0x40, 0xd1, 0x0c]);
    }

    #[test]
    fn test_coinbase_structure() {
        let builder = CoinbaseBuilder::new(840_000, DEFAULT_PAYOUT_SCRIPT.to_vec())
            .with_extra_nonce([1, 2, 3, 4, 5, 6, 7, 8]);
        let wtxid_root = [0x9a; 32];
        let coinbase = builder.build(312_500_000, &wtxid_root);

        assert_eq!(coinbase.txid, double_sha256(&coinbase.raw_tx));
        assert_eq!(coinbase.wtxid, [0u8; 32]);
        assert!(coinbase.raw_tx_with_witness.len() > coinbase.raw_tx.len());
        assert_eq!(
            coinbase.weight(),
            3 * coinbase.raw_tx.len() as u64 + coinbase.raw_tx_with_witness.len() as u64
        );

        // decodes as a well-formed transaction spending the null outpoint
        let decoded = Transaction::decode(&coinbase.raw_tx_with_witness).unwrap();
        assert_eq!(decoded.txid(), coinbase.txid);
        assert_eq!(decoded.inputs.len(), 1);
        assert_eq!(decoded.inputs[0].vout, 0xFFFFFFFF);
        assert_eq!(decoded.inputs[0].prev_txid, [0u8; 32]);
        assert_eq!(decoded.inputs[0].witness, vec![[0u8; 32].to_vec()]);
        assert_eq!(decoded.outputs.len(), 2);
        assert_eq!(decoded.outputs[0].value, 312_500_000);
        assert_eq!(decoded.outputs[0].script_pubkey, DEFAULT_PAYOUT_SCRIPT.to_vec());
    }

    #[test]
    fn test_commitment_output_binds_wtxid_root() {
        let wtxids = [[0u8; 32], [0x11; 32], [0x22; 32]];
        let wtxid_root = merkle_root(&wtxids);

        let builder = CoinbaseBuilder::new(840_000, DEFAULT_PAYOUT_SCRIPT.to_vec());
        let coinbase = builder.build(1_000, &wtxid_root);

        let decoded = Transaction::decode(&coinbase.raw_tx_with_witness).unwrap();
        let script = &decoded.outputs[1].script_pubkey;

        assert_eq!(decoded.outputs[1].value, 0);
        assert_eq!(&script[..6], &[0x6a, 0x24, 0xaa, 0x21, 0xa9, 0xed]);

        let mut data = [0u8; 64];
        data[..32].copy_from_slice(&wtxid_root);
        assert_eq!(&script[6..], &double_sha256(&data)[..]);
    }

    #[test]
    fn test_script_sig_carries_height_and_extra_nonce() {
        let builder = CoinbaseBuilder::new(840_000, vec![0x51])
            .with_extra_nonce([0xaa; 8]);
        let coinbase = builder.build(0, &[0u8; 32]);

        let decoded = Transaction::decode(&coinbase.raw_tx).unwrap();
        let script_sig = &decoded.inputs[0].script_sig;
        assert_eq!(script_sig[0], 3); // push of the 3-byte height
        assert_eq!(&script_sig[1..4], &[0x40, 0xd1, 0x0c]);
        assert_eq!(&script_sig[4..], &[0xaa; 8]);
    }

    #[test]
    fn test_extra_nonce_changes_txid() {
        let root = [0u8; 32];
        let a = CoinbaseBuilder::new(840_000, vec![0x51]).build(0, &root);
        let b = CoinbaseBuilder::new(840_000, vec![0x51])
            .with_extra_nonce([1; 8])
            .build(0, &root);
        assert_ne!(a.txid, b.txid);
    }
}
