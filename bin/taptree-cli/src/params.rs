use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context};
use bitcoin::{Amount, Network, ScriptBuf};
use secp256k1::XOnlyPublicKey;
use serde::Deserialize;
use taptree_params::prelude::{NetworkParams, SigningParams};
use taptree_primitives::{secp::parse_xonly_key, tree::ScriptTree};
use taptree_spend::output::TaprootOutput;

/// Describes one taproot output and how to sign for it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OutputDescriptor {
    #[serde(default)]
    pub(crate) network: Option<Network>,

    /// Hex-encoded x-only (32 bytes) or compressed (33 bytes) internal key.
    #[serde(default)]
    pub(crate) internal_key: Option<String>,

    #[serde(default)]
    pub(crate) tree: Option<ScriptTree>,

    #[serde(flatten)]
    pub(crate) signing: SigningParams,
}

impl OutputDescriptor {
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read descriptor file {}", path.display()))?;

        Self::from_toml(&contents)
    }

    pub(crate) fn from_toml(contents: &str) -> Result<Self, anyhow::Error> {
        toml::from_str(contents)
            .map_err(|e| anyhow!(format!("Failed to parse descriptor file: {}", e)))
    }

    pub(crate) fn network_params(&self) -> NetworkParams {
        self.network.map(NetworkParams::new).unwrap_or_default()
    }

    pub(crate) fn internal_key(&self) -> Result<Option<XOnlyPublicKey>, anyhow::Error> {
        self.internal_key
            .as_deref()
            .map(|key| {
                let bytes = hex::decode(key).context("internal key is not hex")?;
                parse_xonly_key(&bytes).context("invalid internal key")
            })
            .transpose()
    }

    pub(crate) fn build_output(&self) -> Result<TaprootOutput, anyhow::Error> {
        let network = self.network_params();

        let output = match (self.internal_key()?, self.tree.clone()) {
            (Some(internal_key), tree) => TaprootOutput::new(&network, internal_key, tree)?,
            (None, Some(tree)) => TaprootOutput::script_only(&network, tree)?,
            (None, None) => bail!("descriptor needs an internal key, a tree or both"),
        };

        Ok(output)
    }
}

/// A spent output: its scriptPubKey and amount.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Prevout {
    pub(crate) script_pubkey: ScriptBuf,
    pub(crate) amount: Amount,
}

/// The prevouts of every input of a transaction, in input order.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Prevouts {
    pub(crate) prevouts: Vec<Prevout>,
}

impl Prevouts {
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read prevouts file {}", path.display()))?;
        let prevouts: Self = toml::from_str(&contents)
            .map_err(|e| anyhow!(format!("Failed to parse prevouts file: {}", e)))?;

        Ok(prevouts)
    }

    /// Splits the prevouts into the per-input lists the signers take.
    pub(crate) fn into_lists(self) -> (Vec<ScriptBuf>, Vec<Amount>) {
        self.prevouts
            .into_iter()
            .map(|prevout| (prevout.script_pubkey, prevout.amount))
            .unzip()
    }
}
