use anyhow::Result;
use bitcoin::hex::DisplayHex;
use tracing::info;

use crate::{cli::OutputArgs, params::OutputDescriptor};

pub(crate) fn handle_output(args: OutputArgs) -> Result<()> {
    let OutputArgs { descriptor } = args;
    let descriptor = OutputDescriptor::from_path(descriptor)?;

    let output = descriptor.build_output()?;
    info!(action = "built output", kind = ?output.kind(), network = %output.network().network());

    println!("script_pubkey: {}", output.script_pubkey().as_bytes().to_lower_hex_string());
    println!("address: {}", output.address());
    println!("internal_key: {}", output.internal_key());
    println!("output_key: {}", output.output_key());
    println!("output_parity: {:?}", output.output_parity());

    if let Some(merkle_root) = output.merkle_root() {
        println!("merkle_root: {merkle_root}");
    }

    for (index, leaf_hash) in output.leaf_hashes().into_iter().enumerate() {
        let control_block = output.control_block(index)?;

        println!("leaf {index}:");
        println!("  leaf_hash: {leaf_hash}");
        println!(
            "  control_block: {}",
            control_block.serialize().to_lower_hex_string()
        );
    }

    Ok(())
}
