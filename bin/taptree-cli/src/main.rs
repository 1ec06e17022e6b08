//! CLI for building taproot outputs and signing spends of them.

mod cli;
mod handlers;
mod params;

use anyhow::{Error, Result};
use clap::Parser;
use taptree_common::logging::{self, LoggerConfig};

use crate::handlers::{output, sign};

fn main() -> Result<(), Error> {
    logging::init(LoggerConfig::new("taptree-cli".to_string()));

    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::Output(args) => output::handle_output(args),
        cli::Commands::SignKeyPath(args) => sign::handle_sign_key_path(args),
        cli::Commands::SignScriptPath(args) => sign::handle_sign_script_path(args),
    }
}
