//! Taproot outputs.

use bitcoin::{
    key::TweakedPublicKey, opcodes::all::OP_PUSHNUM_1, psbt::Input, script::Builder, Address,
    Amount, ScriptBuf, TxOut, Witness,
};
use secp256k1::{Parity, XOnlyPublicKey};
use taptree_params::prelude::NetworkParams;
use taptree_primitives::{
    constants::UNSPENDABLE_INTERNAL_KEY,
    hashes::{LeafHash, NodeHash},
    tree::ScriptTree,
    tweak::{tap_tweak, TweakedKey},
};
use tracing::debug;

use crate::{
    control_block::ControlBlock,
    errors::{OutputError, OutputResult},
    witness::{assemble_key_path, assemble_script_path, finalize_input, TaprootWitness},
};

/// The spending paths an output offers.
///
/// Resolved once when the output is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Only the key path: there is no script tree.
    KeyOnly,

    /// Only the script path: the internal key is the unspendable point `H`.
    ScriptOnly,

    /// Both the key path and the script path.
    KeyAndScript,
}

/// A pay-to-taproot output.
///
/// The tweaked key is computed once at construction. The tree is kept so control blocks can be
/// built at spend time; they are never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaprootOutput {
    network: NetworkParams,
    internal_key: XOnlyPublicKey,
    tree: Option<ScriptTree>,
    tweaked: TweakedKey,
    kind: OutputKind,
}

impl TaprootOutput {
    /// Creates an output committing to `internal_key` and the optional script tree.
    pub fn new(
        network: &NetworkParams,
        internal_key: XOnlyPublicKey,
        tree: Option<ScriptTree>,
    ) -> OutputResult<Self> {
        let tweaked = tap_tweak(&internal_key, tree.as_ref().map(ScriptTree::root_hash))?;

        let kind = match &tree {
            None => OutputKind::KeyOnly,
            Some(_) if internal_key == *UNSPENDABLE_INTERNAL_KEY => OutputKind::ScriptOnly,
            Some(_) => OutputKind::KeyAndScript,
        };

        debug!(
            network = %network.network(),
            ?kind,
            %internal_key,
            output_key = %tweaked.output_key(),
            "created taproot output"
        );

        Ok(Self {
            network: *network,
            internal_key,
            tree,
            tweaked,
            kind,
        })
    }

    /// Creates an output that can only be spent via the key path.
    pub fn key_only(network: &NetworkParams, internal_key: XOnlyPublicKey) -> OutputResult<Self> {
        Self::new(network, internal_key, None)
    }

    /// Creates an output that can only be spent via the script path.
    ///
    /// The internal key is the unspendable point `H` from BIP341.
    pub fn script_only(network: &NetworkParams, tree: ScriptTree) -> OutputResult<Self> {
        Self::new(network, *UNSPENDABLE_INTERNAL_KEY, Some(tree))
    }

    /// Returns the spending paths of this output.
    pub const fn kind(&self) -> OutputKind {
        self.kind
    }

    /// Returns the network parameters the output was created with.
    pub const fn network(&self) -> &NetworkParams {
        &self.network
    }

    /// Returns the internal key.
    pub const fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_key
    }

    /// Returns the script tree, if any.
    pub const fn tree(&self) -> Option<&ScriptTree> {
        self.tree.as_ref()
    }

    /// Returns the merkle root of the script tree, if any.
    pub fn merkle_root(&self) -> Option<NodeHash> {
        self.tree.as_ref().map(ScriptTree::root_hash)
    }

    /// Returns the tweaked key.
    pub const fn tweaked_key(&self) -> &TweakedKey {
        &self.tweaked
    }

    /// Returns the x-only output key.
    pub const fn output_key(&self) -> XOnlyPublicKey {
        self.tweaked.output_key()
    }

    /// Returns the parity of the output key.
    pub const fn output_parity(&self) -> Parity {
        self.tweaked.output_parity()
    }

    /// Returns the hashes of all leaves in index order.
    pub fn leaf_hashes(&self) -> Vec<LeafHash> {
        self.tree
            .as_ref()
            .map(|tree| tree.leaves().into_iter().map(|leaf| leaf.leaf_hash()).collect())
            .unwrap_or_default()
    }

    /// Returns the scriptPubKey: `OP_1 OP_PUSHBYTES_32 <output_key>`.
    pub fn script_pubkey(&self) -> ScriptBuf {
        Builder::new()
            .push_opcode(OP_PUSHNUM_1)
            .push_slice(self.output_key().serialize())
            .into_script()
    }

    /// Returns the bech32m address of this output on the configured network.
    pub fn address(&self) -> Address {
        let output_key = TweakedPublicKey::dangerous_assume_tweaked(self.output_key());

        Address::p2tr_tweaked(output_key, self.network.hrp())
    }

    /// Returns a transaction output paying `value` to this output.
    pub fn tx_out(&self, value: Amount) -> TxOut {
        TxOut {
            value,
            script_pubkey: self.script_pubkey(),
        }
    }

    /// Builds the control block for the leaf at `leaf_index`.
    pub fn control_block(&self, leaf_index: usize) -> OutputResult<ControlBlock> {
        let tree = self.tree.as_ref().ok_or(OutputError::NoScriptTree)?;

        Ok(ControlBlock::build(
            self.internal_key,
            tree,
            leaf_index,
            self.output_parity(),
        )?)
    }

    /// Converts generic witness data into the final witness stack.
    ///
    /// Script-path witnesses get the leaf script and its control block appended.
    pub fn finalize_witness(&self, witness: TaprootWitness) -> OutputResult<Witness> {
        match witness {
            TaprootWitness::Key { signature } => Ok(assemble_key_path(&signature)),
            TaprootWitness::Script {
                leaf_index,
                script_inputs,
            } => {
                let tree = self.tree.as_ref().ok_or(OutputError::NoScriptTree)?;
                let leaf = tree.leaf(leaf_index)?;
                let control_block = self.control_block(leaf_index)?;

                Ok(assemble_script_path(script_inputs, leaf, &control_block))
            }
        }
    }

    /// Finalizes the PSBT `input` that spends this output.
    ///
    /// If the leaf uses a relative timelock, the **sequence** of the transaction input must be
    /// set accordingly by the caller.
    pub fn finalize_input(&self, input: &mut Input, witness: TaprootWitness) -> OutputResult<()> {
        let witness = self.finalize_witness(witness)?;
        finalize_input(input, witness);

        Ok(())
    }
}
