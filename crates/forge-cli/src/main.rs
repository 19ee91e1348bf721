//! mempool-forge: validate a mempool directory and mine one block.

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info, warn};

use forge_core::block::{AssembleParams, BlockTemplate};
use forge_core::hash::hash_to_display_hex;
use forge_core::params::block_subsidy;
use forge_core::validate::validate_transaction;

mod config;
mod mempool;
mod output;

use config::Config;

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let entries = mempool::load_dir(&config.mempool_dir)?;
    info!(
        "loaded {} mempool records from {}",
        entries.len(),
        config.mempool_dir.display()
    );

    let mut accepted = Vec::new();
    let mut rejected = 0usize;
    for entry in &entries {
        match validate_transaction(&entry.tx, &entry.id) {
            Ok(tx) => accepted.push(tx),
            Err(e) => {
                rejected += 1;
                warn!("rejecting {}: {}", entry.id, e);
            }
        }
    }
    info!(
        "validated {} transactions ({} rejected)",
        accepted.len(),
        rejected
    );

    let mut params = AssembleParams::new(current_timestamp());
    params.block_height = config.block_height;
    params.subsidy = block_subsidy(config.block_height);
    params.payout_script = config.payout_script.clone();

    let mut template = BlockTemplate::assemble(accepted, &params)?;
    info!(
        "assembled block: {} transactions, {} weight units, {} sat in fees",
        template.txids.len(),
        template.total_weight,
        template.total_fee
    );

    let hash = template.mine();
    info!(
        "mined block {} with nonce {}",
        hash_to_display_hex(&hash),
        template.header.nonce
    );

    output::write_block(&config.output_path, &template)?;
    info!("wrote block artifact to {}", config.output_path.display());

    Ok(())
}

fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
