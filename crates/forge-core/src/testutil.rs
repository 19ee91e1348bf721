//! Shared fixtures for signature-path tests.

use alloc::vec;
use alloc::vec::Vec;

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};

use crate::hash::hash160;
use crate::sighash::{legacy_digest, p2wpkh_script_code, segwit_v0_digest, SIGHASH_ALL};
use crate::tx::{Prevout, ScriptType, Transaction, TxInput, TxOutput};

/// Deterministic key pair from a repeated seed byte (any nonzero byte
/// yields a valid scalar).
pub(crate) fn test_key(seed: u8) -> (SigningKey, Vec<u8>) {
    let key = SigningKey::from_slice(&[seed; 32]).unwrap();
    let pubkey = key
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec();
    (key, pubkey)
}

pub(crate) fn p2pkh_script(keyhash: [u8; 20]) -> Vec<u8> {
    let mut script = vec![0x76, 0xa9, 0x14];
    script.extend_from_slice(&keyhash);
    script.extend_from_slice(&[0x88, 0xac]);
    script
}

/// Append a minimal push of `item` (single length byte; item < 76 bytes).
pub(crate) fn push_item(script: &mut Vec<u8>, item: &[u8]) {
    script.push(item.len() as u8);
    script.extend_from_slice(item);
}

fn der_with_flag(sig: Signature) -> Vec<u8> {
    let normalized = sig.normalize_s().unwrap_or(sig);
    let mut bytes = normalized.to_der().as_bytes().to_vec();
    bytes.push(SIGHASH_ALL);
    bytes
}

fn unsigned_single_input_tx(prevout: Prevout, value_out: u64) -> Transaction {
    Transaction {
        version: 2,
        locktime: 0,
        inputs: vec![TxInput {
            prev_txid: [0x5a; 32],
            vout: 1,
            script_sig: Vec::new(),
            sequence: 0xffffffff,
            witness: Vec::new(),
            prevout: Some(prevout),
        }],
        outputs: vec![TxOutput {
            value: value_out,
            script_pubkey: p2pkh_script([0x33; 20]),
        }],
    }
}

/// Single-input P2PKH transaction carrying a valid signature.
pub(crate) fn signed_p2pkh_tx(value_in: u64, value_out: u64) -> (Transaction, Prevout) {
    let (key, pubkey) = test_key(7);
    let prevout = Prevout {
        value: value_in,
        script_pubkey: p2pkh_script(hash160(&pubkey)),
        script_type: ScriptType::P2pkh,
    };
    let mut tx = unsigned_single_input_tx(prevout.clone(), value_out);

    let digest = legacy_digest(&tx, 0, &prevout.script_pubkey, SIGHASH_ALL);
    let sig: Signature = key.sign_prehash(&digest).unwrap();

    let mut script_sig = Vec::new();
    push_item(&mut script_sig, &der_with_flag(sig));
    push_item(&mut script_sig, &pubkey);
    tx.inputs[0].script_sig = script_sig;
    (tx, prevout)
}

/// Single-input P2WPKH transaction carrying a valid witness.
pub(crate) fn signed_p2wpkh_tx(value_in: u64, value_out: u64) -> (Transaction, Prevout) {
    let (key, pubkey) = test_key(11);
    let keyhash = hash160(&pubkey);

    let mut script_pubkey = vec![0x00, 0x14];
    script_pubkey.extend_from_slice(&keyhash);
    let prevout = Prevout {
        value: value_in,
        script_pubkey,
        script_type: ScriptType::P2wpkh,
    };
    let mut tx = unsigned_single_input_tx(prevout.clone(), value_out);

    let digest = segwit_v0_digest(
        &tx,
        0,
        &p2wpkh_script_code(&keyhash),
        value_in,
        SIGHASH_ALL,
    );
    let sig: Signature = key.sign_prehash(&digest).unwrap();
    tx.inputs[0].witness = vec![der_with_flag(sig), pubkey];
    (tx, prevout)
}
