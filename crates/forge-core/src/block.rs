//! Block header construction, transaction selection and mining.

use alloc::vec::Vec;

use crate::coinbase::{CoinbaseBuilder, CoinbaseTransaction};
use crate::difficulty::{bits_to_target, hash_meets_target};
use crate::error::AssembleError;
use crate::hash::{double_sha256, reverse_bytes};
use crate::merkle::merkle_root;
use crate::params::{
    block_subsidy, BITS, BLOCK_VERSION, DEFAULT_BLOCK_HEIGHT, DEFAULT_PAYOUT_SCRIPT,
    MAX_BLOCK_WEIGHT,
};
use crate::validate::AcceptedTx;

/// A block header (80 bytes).
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub version: i32,
    /// Hash of the previous block, internal byte order.
    pub prev_block_hash: [u8; 32],
    /// Merkle root over the included txids, internal byte order.
    pub merkle_root: [u8; 32],
    /// Block timestamp (Unix time).
    pub timestamp: u32,
    /// Difficulty target in compact "bits" format.
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn new(prev_block_hash: [u8; 32], merkle_root: [u8; 32], timestamp: u32, bits: u32) -> Self {
        BlockHeader {
            version: BLOCK_VERSION,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce: 0,
        }
    }

    /// Serialize the header to its fixed 80-byte layout.
    pub fn serialize(&self) -> [u8; 80] {
        let mut header = [0u8; 80];
        header[..76].copy_from_slice(&self.serialize_without_nonce());
        header[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        header
    }

    /// The 76-byte prefix that stays fixed while the nonce is searched.
    pub fn serialize_without_nonce(&self) -> [u8; 76] {
        let mut header = [0u8; 76];
        header[0..4].copy_from_slice(&self.version.to_le_bytes());
        header[4..36].copy_from_slice(&self.prev_block_hash);
        header[36..68].copy_from_slice(&self.merkle_root);
        header[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        header[72..76].copy_from_slice(&self.bits.to_le_bytes());
        header
    }

    /// Compute the block hash (double SHA256, internal byte order).
    pub fn hash(&self) -> [u8; 32] {
        double_sha256(&self.serialize())
    }

    /// The 256-bit target this header mines against.
    pub fn target(&self) -> [u8; 32] {
        bits_to_target(self.bits)
    }
}

/// Assembly-time configuration: payout, subsidy and header fields.
#[derive(Debug, Clone)]
pub struct AssembleParams {
    pub block_height: u32,
    pub payout_script: Vec<u8>,
    pub subsidy: u64,
    pub prev_block_hash: [u8; 32],
    pub bits: u32,
    pub timestamp: u32,
}

impl AssembleParams {
    /// Engine defaults: compiled-in height and payout script, subsidy from
    /// the halving schedule, null previous block.
    pub fn new(timestamp: u32) -> Self {
        AssembleParams {
            block_height: DEFAULT_BLOCK_HEIGHT,
            payout_script: DEFAULT_PAYOUT_SCRIPT.to_vec(),
            subsidy: block_subsidy(DEFAULT_BLOCK_HEIGHT),
            prev_block_hash: [0u8; 32],
            bits: BITS,
            timestamp,
        }
    }
}

/// Commit to the deterministic inclusion order: ascending fee per weight
/// unit, ties broken by display-order txid.
pub fn selection_order(accepted: &mut [AcceptedTx]) {
    accepted.sort_by(|a, b| {
        let left = u128::from(a.fee) * u128::from(b.weight);
        let right = u128::from(b.fee) * u128::from(a.weight);
        left.cmp(&right)
            .then_with(|| reverse_bytes(&a.txid).cmp(&reverse_bytes(&b.txid)))
    });
}

/// A fully assembled block, ready for the nonce search.
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub header: BlockHeader,
    pub coinbase: CoinbaseTransaction,
    /// Included txids in selection order, internal byte order, coinbase
    /// excluded.
    pub txids: Vec<[u8; 32]>,
    pub total_fee: u64,
    pub total_weight: u64,
}

impl BlockTemplate {
    /// Select from the accepted set, synthesize the coinbase and build the
    /// header. Fails if nothing fits in the block.
    pub fn assemble(
        mut accepted: Vec<AcceptedTx>,
        params: &AssembleParams,
    ) -> Result<Self, AssembleError> {
        selection_order(&mut accepted);

        let builder = CoinbaseBuilder::new(params.block_height, params.payout_script.clone());
        // the commitment value does not change the coinbase's size, so a
        // placeholder build yields the exact weight
        let coinbase_weight = builder.build(0, &[0u8; 32]).weight();

        let mut selected: Vec<&AcceptedTx> = Vec::new();
        let mut total_weight = coinbase_weight;
        let mut total_fee = 0u64;
        for tx in &accepted {
            if total_weight + tx.weight > MAX_BLOCK_WEIGHT {
                continue;
            }
            total_weight += tx.weight;
            total_fee += tx.fee;
            selected.push(tx);
        }
        if selected.is_empty() {
            return Err(AssembleError::NoEligibleTransactions);
        }

        // wtxid tree: the zero coinbase wtxid leads
        let mut wtxid_leaves = Vec::with_capacity(selected.len() + 1);
        wtxid_leaves.push([0u8; 32]);
        wtxid_leaves.extend(selected.iter().map(|tx| tx.wtxid));
        let wtxid_root = merkle_root(&wtxid_leaves);

        let coinbase = builder.build(total_fee + params.subsidy, &wtxid_root);

        // txid tree: the coinbase txid leads
        let mut txid_leaves = Vec::with_capacity(selected.len() + 1);
        txid_leaves.push(coinbase.txid);
        txid_leaves.extend(selected.iter().map(|tx| tx.txid));
        let root = merkle_root(&txid_leaves);

        let header = BlockHeader::new(params.prev_block_hash, root, params.timestamp, params.bits);

        Ok(BlockTemplate {
            header,
            coinbase,
            txids: selected.iter().map(|tx| tx.txid).collect(),
            total_fee,
            total_weight,
        })
    }

    /// Search the nonce space until the reversed header hash meets the
    /// target. Exhausting all 2^32 nonces bumps the timestamp by one
    /// second and restarts the sweep.
    ///
    /// Returns the winning hash in internal byte order.
    pub fn mine(&mut self) -> [u8; 32] {
        let target = self.header.target();
        loop {
            let mut buf = [0u8; 80];
            buf[..76].copy_from_slice(&self.header.serialize_without_nonce());

            for nonce in 0..=u32::MAX {
                buf[76..80].copy_from_slice(&nonce.to_le_bytes());
                let hash = double_sha256(&buf);
                if hash_meets_target(&reverse_bytes(&hash), &target) {
                    self.header.nonce = nonce;
                    return hash;
                }
            }

            self.header.timestamp = self.header.timestamp.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::Transaction;
    use alloc::vec;

    fn accepted(txid_byte: u8, fee: u64, weight: u64) -> AcceptedTx {
        AcceptedTx {
            txid: [txid_byte; 32],
            wtxid: [txid_byte ^ 0xff; 32],
            fee,
            weight,
        }
    }

    fn test_params() -> AssembleParams {
        AssembleParams::new(1_700_000_000)
    }

    #[test]
    fn test_header_serialization_layout() {
        let mut header = BlockHeader::new([0x12; 32], [0x34; 32], 1_700_000_000, BITS);
        header.nonce = 0xDEADBEEF;

        let serialized = header.serialize();
        assert_eq!(serialized.len(), crate::params::BLOCK_HEADER_SIZE);
        assert_eq!(&serialized[0..4], &[0x04, 0x00, 0x00, 0x00]);
        assert_eq!(&serialized[4..36], &[0x12; 32]);
        assert_eq!(&serialized[36..68], &[0x34; 32]);
        assert_eq!(&serialized[68..72], &1_700_000_000u32.to_le_bytes());
        assert_eq!(&serialized[72..76], &BITS.to_le_bytes());
        assert_eq!(&serialized[76..80], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn test_selection_order_ascending_feerate() {
        // fee rates: a = 1.0, b = 0.5, c = 2.0
        let mut txs = vec![
            accepted(0xaa, 1_000, 1_000),
            accepted(0xbb, 500, 1_000),
            accepted(0xcc, 2_000, 1_000),
        ];
        selection_order(&mut txs);
        assert_eq!(txs[0].txid, [0xbb; 32]);
        assert_eq!(txs[1].txid, [0xaa; 32]);
        assert_eq!(txs[2].txid, [0xcc; 32]);
    }

    #[test]
    fn test_selection_order_txid_tie_break() {
        let mut txs = vec![accepted(0x22, 100, 400), accepted(0x11, 100, 400)];
        selection_order(&mut txs);
        assert_eq!(txs[0].txid, [0x11; 32]);
        assert_eq!(txs[1].txid, [0x22; 32]);
    }

    #[test]
    fn test_assemble_roots_and_reward() {
        let txs = vec![accepted(0x11, 700, 800), accepted(0x22, 300, 600)];
        let params = test_params();
        let template = BlockTemplate::assemble(txs.clone(), &params).unwrap();

        assert_eq!(template.total_fee, 1_000);
        assert_eq!(template.txids.len(), 2);

        // txid tree: coinbase first, then selection order
        let mut leaves = vec![template.coinbase.txid];
        leaves.extend(template.txids.iter().copied());
        assert_eq!(template.header.merkle_root, merkle_root(&leaves));

        // reward output pays fees + subsidy
        let decoded = Transaction::decode(&template.coinbase.raw_tx).unwrap();
        assert_eq!(decoded.outputs[0].value, 1_000 + params.subsidy);
    }

    #[test]
    fn test_assemble_commits_to_zero_led_wtxid_tree() {
        let txs = vec![accepted(0x11, 700, 800), accepted(0x22, 300, 600)];
        let template = BlockTemplate::assemble(txs.clone(), &test_params()).unwrap();

        // recompute the expected commitment from the wtxid tree with the
        // zero coinbase leaf in front (selection order: 0x22 then 0x11)
        let wtxid_root = merkle_root(&[[0u8; 32], [0x22 ^ 0xff; 32], [0x11 ^ 0xff; 32]]);
        let mut data = [0u8; 64];
        data[..32].copy_from_slice(&wtxid_root);
        let commitment = double_sha256(&data);

        let decoded = Transaction::decode(&template.coinbase.raw_tx_with_witness).unwrap();
        assert_eq!(&decoded.outputs[1].script_pubkey[6..], &commitment[..]);
    }

    #[test]
    fn test_assemble_respects_weight_ceiling() {
        let txs = vec![
            accepted(0x11, 10, 3_990_000),
            accepted(0x22, 100, 2_000_000),
            accepted(0x33, 500, 1_000),
        ];
        let template = BlockTemplate::assemble(txs, &test_params()).unwrap();

        // ascending fee rate puts the huge cheap transaction first; the
        // mid one no longer fits, the light one still does
        assert!(template.total_weight <= MAX_BLOCK_WEIGHT);
        assert_eq!(template.txids, vec![[0x11; 32], [0x33; 32]]);
        assert_eq!(template.total_fee, 510);
    }

    #[test]
    fn test_assemble_rejects_empty_set() {
        assert!(matches!(
            BlockTemplate::assemble(Vec::new(), &test_params()),
            Err(AssembleError::NoEligibleTransactions)
        ));

        // a transaction that can never fit counts as nothing eligible
        let txs = vec![accepted(0x11, 1, 4_000_001)];
        assert!(matches!(
            BlockTemplate::assemble(txs, &test_params()),
            Err(AssembleError::NoEligibleTransactions)
        ));
    }

    #[test]
    fn test_removing_included_tx_does_not_raise_fee() {
        let txs = vec![
            accepted(0x11, 700, 800),
            accepted(0x22, 300, 600),
            accepted(0x33, 450, 500),
        ];
        let params = test_params();
        let full = BlockTemplate::assemble(txs.clone(), &params).unwrap();

        for skip in 0..txs.len() {
            let mut subset = txs.clone();
            subset.remove(skip);
            let reduced = BlockTemplate::assemble(subset, &params).unwrap();
            assert!(reduced.total_fee <= full.total_fee);
        }
    }

    #[test]
    fn test_mine_finds_nonce_for_easy_target() {
        let txs = vec![accepted(0x11, 700, 800)];
        let mut params = test_params();
        // maximal positive target: any hash qualifies immediately
        params.bits = 0x207fffff;
        let mut template = BlockTemplate::assemble(txs, &params).unwrap();

        let hash = template.mine();
        assert_eq!(hash, template.header.hash());
        assert!(hash_meets_target(
            &reverse_bytes(&hash),
            &template.header.target()
        ));

        // the found nonce sits in the last four header bytes
        let serialized = template.header.serialize();
        assert_eq!(&serialized[76..80], &template.header.nonce.to_le_bytes());
    }
}
