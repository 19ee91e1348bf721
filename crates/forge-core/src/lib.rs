//! Transaction validation and block assembly for the mempool-forge engine.
//!
//! This crate provides pure Rust implementations of:
//! - Consensus serialization of transactions (legacy and SegWit wire forms)
//! - Transaction identifiers, weight and virtual size
//! - A script interpreter for P2PKH and P2WPKH spends
//! - Legacy and BIP143 signature-hash construction
//! - Coinbase synthesis with the SegWit witness commitment
//! - Block header construction and the proof-of-work nonce search

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod block;
pub mod codec;
pub mod coinbase;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod params;
pub mod script;
pub mod sighash;
pub mod tx;
pub mod validate;

#[cfg(test)]
mod testutil;

pub use block::{AssembleParams, BlockHeader, BlockTemplate};
pub use coinbase::CoinbaseBuilder;
pub use difficulty::{bits_to_target, hash_meets_target};
pub use error::{AssembleError, DecodeError, ScriptError, ValidateError};
pub use hash::{double_sha256, hash160, hash_to_display_hex};
pub use merkle::merkle_root;
pub use tx::{Prevout, ScriptType, Transaction, TxInput, TxOutput};
pub use validate::{validate_transaction, AcceptedTx};
