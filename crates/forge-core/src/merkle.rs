//! Merkle tree computation over transaction identifiers.

use alloc::vec::Vec;

use crate::hash::double_sha256;

/// Compute the merkle root of a sequence of 32-byte leaves.
///
/// Levels pair left to right; a level with an odd count is extended by
/// duplicating its last entry. The one-leaf case falls under the same
/// rule and hashes the leaf paired with itself. The input is never
/// mutated.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    loop {
        if level.len() % 2 == 1 {
            level.push(level[level.len() - 1]);
        }

        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2) {
            let mut combined = [0u8; 64];
            combined[..32].copy_from_slice(&pair[0]);
            combined[32..].copy_from_slice(&pair[1]);
            next.push(double_sha256(&combined));
        }

        if next.len() == 1 {
            return next[0];
        }
        level = next;
    }
}

/// Compute the witness commitment binding a block to its wtxid set.
///
/// commitment = SHA256d(wtxid_merkle_root || witness_reserved_value)
pub fn compute_witness_commitment(
    wtxid_root: &[u8; 32],
    witness_reserved_value: &[u8; 32],
) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(wtxid_root);
    data[32..].copy_from_slice(witness_reserved_value);
    double_sha256(&data)
}

/// Generate the scriptPubKey for a witness commitment output.
///
/// Format: OP_RETURN <36 bytes: 0xaa21a9ed || commitment>
pub fn witness_commitment_script(witness_commitment: &[u8; 32]) -> Vec<u8> {
    let mut script = Vec::with_capacity(38);
    script.push(0x6a); // OP_RETURN
    script.push(0x24); // push 36 bytes
    script.extend_from_slice(&[0xaa, 0x21, 0xa9, 0xed]);
    script.extend_from_slice(witness_commitment);
    script
}
