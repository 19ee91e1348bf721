//! Runtime configuration for the forge pipeline.

use std::path::PathBuf;

use thiserror::Error;

use forge_core::params::{DEFAULT_BLOCK_HEIGHT, DEFAULT_PAYOUT_SCRIPT};

/// Paths and assembly parameters, with compiled-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one `<txid>.json` file per candidate.
    pub mempool_dir: PathBuf,

    /// Where the block artifact is written.
    pub output_path: PathBuf,

    /// Height encoded into the coinbase scriptSig.
    pub block_height: u32,

    /// scriptPubKey receiving the block reward.
    pub payout_script: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mempool_dir: PathBuf::from("mempool"),
            output_path: PathBuf::from("output.txt"),
            block_height: DEFAULT_BLOCK_HEIGHT,
            payout_script: DEFAULT_PAYOUT_SCRIPT.to_vec(),
        }
    }
}

impl Config {
    /// Build a configuration from the process arguments. The two optional
    /// positional arguments override the mempool directory and the output
    /// path; everything else keeps its default.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(dir) = args.next() {
            config.mempool_dir = PathBuf::from(dir);
        }
        if let Some(path) = args.next() {
            config.output_path = PathBuf::from(path);
        }
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }

        Ok(config)
    }
}
