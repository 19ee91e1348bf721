//! Mempool directory loading and JSON record decoding.
//!
//! Each candidate lives in `<txid>.json`. Records that fail to decode are
//! skipped with a logged note; consensus validation happens later, in the
//! core.

use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use forge_core::tx::{Prevout, ScriptType, Transaction, TxInput, TxOutput};

/// One candidate transaction together with its external identifier.
#[derive(Debug)]
pub struct MempoolEntry {
    /// Filename stem; must equal the txid in display hex to validate.
    pub id: String,
    pub tx: Transaction,
}

#[derive(Error, Debug)]
pub enum MempoolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid hex in {0}")]
    BadHex(&'static str),

    #[error("Referenced txid must be 32 bytes")]
    BadTxidLength,

    #[error("Unknown script type tag: {0}")]
    UnknownScriptType(String),
}

// The on-disk record schema. Field names mirror the JSON keys; the ASM
// renderings and address fields present in the files are ignored.

#[derive(Deserialize)]
struct RawTransaction {
    version: i32,
    locktime: u32,
    vin: Vec<RawInput>,
    vout: Vec<RawOutput>,
}

#[derive(Deserialize)]
struct RawInput {
    txid: String,
    vout: u32,
    #[serde(default)]
    scriptsig: String,
    sequence: u32,
    #[serde(default)]
    witness: Vec<String>,
    prevout: RawPrevout,
}

#[derive(Deserialize)]
struct RawPrevout {
    scriptpubkey: String,
    scriptpubkey_type: String,
    value: u64,
}

#[derive(Deserialize)]
struct RawOutput {
    scriptpubkey: String,
    value: u64,
}

impl RawTransaction {
    fn into_transaction(self) -> Result<Transaction, MempoolError> {
        let mut inputs = Vec::with_capacity(self.vin.len());
        for vin in self.vin {
            let tag = vin.prevout.scriptpubkey_type;
            let script_type = ScriptType::from_tag(&tag)
                .ok_or(MempoolError::UnknownScriptType(tag))?;

            let mut witness = Vec::with_capacity(vin.witness.len());
            for item in &vin.witness {
                witness.push(decode_hex(item, "witness item")?);
            }

            inputs.push(TxInput {
                prev_txid: decode_txid(&vin.txid)?,
                vout: vin.vout,
                script_sig: decode_hex(&vin.scriptsig, "scriptsig")?,
                sequence: vin.sequence,
                witness,
                prevout: Some(Prevout {
                    value: vin.prevout.value,
                    script_pubkey: decode_hex(&vin.prevout.scriptpubkey, "prevout scriptpubkey")?,
                    script_type,
                }),
            });
        }

        let mut outputs = Vec::with_capacity(self.vout.len());
        for vout in self.vout {
            outputs.push(TxOutput {
                value: vout.value,
                script_pubkey: decode_hex(&vout.scriptpubkey, "scriptpubkey")?,
            });
        }

        Ok(Transaction {
            version: self.version,
            locktime: self.locktime,
            inputs,
            outputs,
        })
    }
}

fn decode_hex(s: &str, field: &'static str) -> Result<Vec<u8>, MempoolError> {
    hex::decode(s).map_err(|_| MempoolError::BadHex(field))
}

/// Referenced txids stay in display order in memory; the serializer
/// reverses them onto the wire.
fn decode_txid(s: &str) -> Result<[u8; 32], MempoolError> {
    let bytes = decode_hex(s, "txid")?;
    let mut txid = [0u8; 32];
    if bytes.len() != 32 {
        return Err(MempoolError::BadTxidLength);
    }
    txid.copy_from_slice(&bytes);
    Ok(txid)
}

/// Decode a single mempool record.
pub fn load_file(path: &Path) -> Result<Transaction, MempoolError> {
    let contents = fs::read_to_string(path)?;
    let raw: RawTransaction = serde_json::from_str(&contents)?;
    raw.into_transaction()
}

/// Scan a mempool directory. Files that fail to decode are skipped with a
/// warning; the scan order is fixed by sorting on file name.
pub fn load_dir(dir: &Path) -> std::io::Result<Vec<MempoolEntry>> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!("skipping {}: unreadable file name", path.display());
            continue;
        };
        match load_file(&path) {
            Ok(tx) => entries.push(MempoolEntry {
                id: stem.to_string(),
                tx,
            }),
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }
    Ok(entries)
}
