//! Script interpreter for the supported spend paths.
//!
//! Scripts execute over a stack of byte strings. A P2PKH input runs its
//! scriptSig followed by the prevout's scriptPubKey; a P2WPKH input seeds
//! the stack from its witness and runs the keyhash script implied by the
//! witness program. Raw script bytes are the only source of truth; the
//! human-readable ASM in the mempool records is never consulted.

use alloc::vec::Vec;

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};

use crate::error::ScriptError;
use crate::hash::hash160;
use crate::sighash::{
    legacy_digest, p2wpkh_script_code, segwit_v0_digest, split_signature, SIGHASH_ALL,
};
use crate::tx::{Prevout, Transaction};

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_DUP: u8 = 0x76;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;

/// Which digest construction OP_CHECKSIG uses for this input.
enum SighashKind {
    Legacy,
    SegwitV0,
}

struct Interpreter<'a> {
    stack: Vec<Vec<u8>>,
    tx: &'a Transaction,
    input_index: usize,
    script_code: Vec<u8>,
    amount: u64,
    kind: SighashKind,
}

impl<'a> Interpreter<'a> {
    fn pop(&mut self) -> Result<Vec<u8>, ScriptError> {
        self.stack.pop().ok_or(ScriptError::StackUnderflow)
    }

    fn execute(&mut self, script: &[u8]) -> Result<(), ScriptError> {
        let mut pc = 0usize;
        while pc < script.len() {
            let op = script[pc];
            pc += 1;
            match op {
                OP_0 => self.stack.push(Vec::new()),
                len @ 0x01..=0x4b => {
                    self.stack.push(read_push(script, &mut pc, len as usize)?);
                }
                OP_PUSHDATA1 => {
                    let len = read_push(script, &mut pc, 1)?[0] as usize;
                    self.stack.push(read_push(script, &mut pc, len)?);
                }
                OP_PUSHDATA2 => {
                    let bytes = read_push(script, &mut pc, 2)?;
                    let len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
                    self.stack.push(read_push(script, &mut pc, len)?);
                }
                OP_PUSHDATA4 => {
                    let bytes = read_push(script, &mut pc, 4)?;
                    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    let len = usize::try_from(len).map_err(|_| ScriptError::TruncatedPush)?;
                    self.stack.push(read_push(script, &mut pc, len)?);
                }
                OP_1NEGATE => self.stack.push([0x81].to_vec()),
                n @ OP_1..=OP_16 => self.stack.push([n - 0x50].to_vec()),
                OP_DUP => {
                    let top = self.stack.last().ok_or(ScriptError::StackUnderflow)?.clone();
                    self.stack.push(top);
                }
                OP_HASH160 => {
                    let item = self.pop()?;
                    self.stack.push(hash160(&item).to_vec());
                }
                OP_EQUAL => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.stack.push(if a == b { [1].to_vec() } else { Vec::new() });
                }
                OP_EQUALVERIFY => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    if a != b {
                        return Err(ScriptError::VerifyFailed);
                    }
                }
                OP_CHECKSIG => {
                    let pubkey = self.pop()?;
                    let sig = self.pop()?;
                    let ok = self.check_signature(&sig, &pubkey);
                    self.stack.push(if ok { [1].to_vec() } else { Vec::new() });
                }
                other => return Err(ScriptError::UnknownOpcode(other)),
            }
        }
        Ok(())
    }

    /// ECDSA check against the input-specific digest. Any malformed
    /// signature, flag or key simply yields false, like OP_CHECKSIG.
    fn check_signature(&self, stack_sig: &[u8], pubkey: &[u8]) -> bool {
        let Some((der, flag)) = split_signature(stack_sig) else {
            return false;
        };
        if flag != SIGHASH_ALL {
            return false;
        }
        let Ok(signature) = Signature::from_der(der) else {
            return false;
        };
        // High-S signatures are rejected outright (BIP62)
        if signature.normalize_s().is_some() {
            return false;
        }
        let Ok(key) = VerifyingKey::from_sec1_bytes(pubkey) else {
            return false;
        };

        let digest = match self.kind {
            SighashKind::Legacy => {
                legacy_digest(self.tx, self.input_index, &self.script_code, flag)
            }
            SighashKind::SegwitV0 => segwit_v0_digest(
                self.tx,
                self.input_index,
                &self.script_code,
                self.amount,
                flag,
            ),
        };
        key.verify_prehash(&digest, &signature).is_ok()
    }

    /// Script succeeds iff the stack is non-empty and its top element has
    /// at least one non-zero byte.
    fn finish(mut self) -> Result<(), ScriptError> {
        let top = self.stack.pop().ok_or(ScriptError::EvaluatedFalse)?;
        if top.iter().all(|byte| *byte == 0) {
            return Err(ScriptError::EvaluatedFalse);
        }
        Ok(())
    }
}

fn read_push(script: &[u8], pc: &mut usize, len: usize) -> Result<Vec<u8>, ScriptError> {
    let end = pc.checked_add(len).ok_or(ScriptError::TruncatedPush)?;
    if end > script.len() {
        return Err(ScriptError::TruncatedPush);
    }
    let bytes = script[*pc..end].to_vec();
    *pc = end;
    Ok(bytes)
}

/// Verify a legacy P2PKH input: scriptSig then scriptPubKey.
pub fn run_p2pkh(tx: &Transaction, index: usize, prevout: &Prevout) -> Result<(), ScriptError> {
    let mut interp = Interpreter {
        stack: Vec::new(),
        tx,
        input_index: index,
        script_code: prevout.script_pubkey.clone(),
        amount: prevout.value,
        kind: SighashKind::Legacy,
    };
    interp.execute(&tx.inputs[index].script_sig)?;
    interp.execute(&prevout.script_pubkey)?;
    interp.finish()
}

/// Verify a P2WPKH input: the witness must be `[signature, pubkey]` and is
/// run against the keyhash script derived from the witness program.
pub fn run_p2wpkh(tx: &Transaction, index: usize, prevout: &Prevout) -> Result<(), ScriptError> {
    let input = &tx.inputs[index];
    if !input.script_sig.is_empty() {
        return Err(ScriptError::ScriptSigNotEmpty);
    }
    if input.witness.len() != 2 {
        return Err(ScriptError::MalformedWitness);
    }
    let keyhash = v0_keyhash_program(&prevout.script_pubkey)?;
    let script_code = p2wpkh_script_code(keyhash);

    let mut interp = Interpreter {
        stack: input.witness.clone(),
        tx,
        input_index: index,
        script_code: script_code.clone(),
        amount: prevout.value,
        kind: SighashKind::SegwitV0,
    };
    interp.execute(&script_code)?;
    interp.finish()
}

/// Extract the 20-byte program from an `OP_0 <20>` scriptPubKey.
fn v0_keyhash_program(script_pubkey: &[u8]) -> Result<&[u8], ScriptError> {
    if script_pubkey.len() == 22 && script_pubkey[0] == 0x00 && script_pubkey[1] == 0x14 {
        Ok(&script_pubkey[2..])
    } else {
        Err(ScriptError::MalformedProgram)
    }
}
