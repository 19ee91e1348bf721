//! Signature-hash construction for legacy and SegWit v0 inputs.

use alloc::vec::Vec;

use crate::codec::write_compact_size;
use crate::hash::{double_sha256, reverse_bytes};
use crate::tx::Transaction;

/// The only sighash flag this engine verifies.
pub const SIGHASH_ALL: u8 = 0x01;

/// Split a stack signature into its DER bytes and trailing sighash flag.
pub fn split_signature(stack_sig: &[u8]) -> Option<(&[u8], u8)> {
    stack_sig.split_last().map(|(flag, der)| (der, *flag))
}

/// The P2PKH-equivalent scriptCode for a P2WPKH spend of `keyhash`.
pub fn p2wpkh_script_code(keyhash: &[u8]) -> Vec<u8> {
    let mut code = Vec::with_capacity(25);
    code.extend_from_slice(&[0x76, 0xa9, 0x14]);
    code.extend_from_slice(keyhash);
    code.extend_from_slice(&[0x88, 0xac]);
    code
}

/// Legacy digest for input `index`.
///
/// Every other input's scriptSig is cleared, input `index` gets
/// `script_code` in its place, and the 4-byte flag is appended to the
/// legacy serialization before double hashing.
pub fn legacy_digest(tx: &Transaction, index: usize, script_code: &[u8], flag: u8) -> [u8; 32] {
    let mut copy = tx.clone();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.script_sig = if i == index {
            script_code.to_vec()
        } else {
            Vec::new()
        };
    }

    let mut preimage = copy.serialize_legacy();
    preimage.extend_from_slice(&u32::from(flag).to_le_bytes());
    double_sha256(&preimage)
}

/// BIP143 digest for input `index` of a SegWit v0 spend.
///
/// `script_code` is the script being satisfied (the keyhash script for
/// P2WPKH) and `amount` the spent output's value.
pub fn segwit_v0_digest(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    amount: u64,
    flag: u8,
) -> [u8; 32] {
    let input = &tx.inputs[index];

    let hash_prevouts = double_sha256(&tx.serialize_all_outpoints());
    let hash_sequence = double_sha256(&tx.serialize_all_sequences());
    let hash_outputs = double_sha256(&tx.serialize_all_outputs());

    let mut preimage = Vec::with_capacity(157 + script_code.len());
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    preimage.extend_from_slice(&reverse_bytes(&input.prev_txid));
    preimage.extend_from_slice(&input.vout.to_le_bytes());
    write_compact_size(&mut preimage, script_code.len() as u64);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&tx.locktime.to_le_bytes());
    preimage.extend_from_slice(&u32::from(flag).to_le_bytes());

    double_sha256(&preimage)
}
