//! Block artifact writer.

use std::fs;
use std::path::Path;

use forge_core::block::BlockTemplate;
use forge_core::hash::hash_to_display_hex;

/// Render the four-section artifact: header, coinbase wire bytes, the
/// coinbase txid and then every included txid, one per line.
pub fn render_block(template: &BlockTemplate) -> String {
    let mut out = String::new();
    out.push_str(&hex::encode(template.header.serialize()));
    out.push('\n');
    out.push_str(&hex::encode(&template.coinbase.raw_tx_with_witness));
    out.push('\n');
    out.push_str(&hash_to_display_hex(&template.coinbase.txid));
    out.push('\n');
    for txid in &template.txids {
        out.push_str(&hash_to_display_hex(txid));
        out.push('\n');
    }
    out
}

pub fn write_block(path: &Path, template: &BlockTemplate) -> std::io::Result<()> {
    fs::write(path, render_block(template))
}
