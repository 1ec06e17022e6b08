use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taptree-cli",
    about = "Build taproot outputs and sign spends of them",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Output(OutputArgs),

    SignKeyPath(SignKeyPathArgs),

    SignScriptPath(SignScriptPathArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Print the scriptPubKey, address and control blocks of an output",
    version
)]
pub(crate) struct OutputArgs {
    #[arg(long, help = "the path to the output descriptor file")]
    pub(crate) descriptor: PathBuf,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Sign an input on the key path", version)]
pub(crate) struct SignKeyPathArgs {
    #[clap(flatten)]
    pub(crate) spend_args: SpendArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Sign an input on a single-key leaf of the script tree", version)]
pub(crate) struct SignScriptPathArgs {
    #[arg(long, help = "the index of the leaf to spend, in depth-first order")]
    pub(crate) leaf_index: usize,

    #[clap(flatten)]
    pub(crate) spend_args: SpendArgs,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct SpendArgs {
    #[arg(long, help = "the path to the output descriptor file")]
    pub(crate) descriptor: PathBuf,

    #[arg(long, help = "the path to the file listing the prevouts of every input")]
    pub(crate) prevouts: PathBuf,

    #[arg(long, help = "the unsigned transaction, consensus encoded as hex")]
    pub(crate) tx: String,

    #[arg(long, help = "the index of the input to sign")]
    pub(crate) input_index: usize,

    #[arg(
        long = "secret-key",
        env = "TAPTREE_SECRET_KEY",
        hide_env_values = true,
        help = "the hex-encoded secret key to sign with"
    )]
    pub(crate) secret_key: String,
}
