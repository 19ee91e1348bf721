//! Per-transaction consensus validation.
//!
//! Each candidate runs the same gauntlet: structural checks, amount
//! conservation, identifier self-consistency, then one script execution
//! per input. Failure at any step rejects the whole transaction; there is
//! no partial acceptance.

use alloc::string::String;

use crate::error::ValidateError;
use crate::script;
use crate::tx::{ScriptType, Transaction};

/// A transaction that passed validation, reduced to the facts the block
/// assembler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTx {
    /// Identifier, internal byte order.
    pub txid: [u8; 32],
    /// Witness identifier, internal byte order.
    pub wtxid: [u8; 32],
    /// Fee in satoshis.
    pub fee: u64,
    /// Block weight.
    pub weight: u64,
}

/// Validate one candidate against the consensus rules.
///
/// `expected_id` is the external identifier (the mempool filename stem);
/// it must equal the computed txid in display hex.
pub fn validate_transaction(
    tx: &Transaction,
    expected_id: &str,
) -> Result<AcceptedTx, ValidateError> {
    check_structure(tx)?;
    let fee = check_amounts(tx)?;

    if tx.txid_hex() != expected_id {
        return Err(ValidateError::IdMismatch);
    }

    for (index, input) in tx.inputs.iter().enumerate() {
        let prevout = input
            .prevout
            .as_ref()
            .ok_or(ValidateError::Malformed("input missing prevout view"))?;
        match prevout.script_type {
            ScriptType::P2pkh => script::run_p2pkh(tx, index, prevout)?,
            ScriptType::P2wpkh => script::run_p2wpkh(tx, index, prevout)?,
            other => return Err(ValidateError::UnsupportedType(String::from(other.name()))),
        }
    }

    Ok(AcceptedTx {
        txid: tx.txid(),
        wtxid: tx.wtxid(),
        fee,
        weight: tx.weight(),
    })
}

fn check_structure(tx: &Transaction) -> Result<(), ValidateError> {
    if !(1..=2).contains(&tx.version) {
        return Err(ValidateError::Malformed("version must be 1 or 2"));
    }
    if tx.inputs.is_empty() {
        return Err(ValidateError::Malformed("no inputs"));
    }
    if tx.outputs.is_empty() {
        return Err(ValidateError::Malformed("no outputs"));
    }
    for input in &tx.inputs {
        match &input.prevout {
            None => return Err(ValidateError::Malformed("input missing prevout view")),
            Some(prevout) if prevout.script_pubkey.is_empty() => {
                return Err(ValidateError::Malformed("prevout missing scriptPubKey"));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_amounts(tx: &Transaction) -> Result<u64, ValidateError> {
    let mut total_in: u64 = 0;
    for input in &tx.inputs {
        let value = input.prevout.as_ref().map_or(0, |p| p.value);
        total_in = total_in
            .checked_add(value)
            .ok_or(ValidateError::Malformed("input value overflow"))?;
    }

    let mut total_out: u64 = 0;
    for output in &tx.outputs {
        total_out = total_out
            .checked_add(output.value)
            .ok_or(ValidateError::Malformed("output value overflow"))?;
    }

    if total_in < total_out {
        return Err(ValidateError::AmountUnderflow);
    }
    Ok(total_in - total_out)
}
