//! Control blocks for script-path spends.

use secp256k1::{Parity, XOnlyPublicKey};
use taptree_primitives::{
    constants::{
        TAPROOT_CONTROL_BASE_SIZE, TAPROOT_CONTROL_MAX_NODE_COUNT, TAPROOT_CONTROL_NODE_SIZE,
        TAPROOT_LEAF_MASK,
    },
    errors::TreeResult,
    hashes::NodeHash,
    leaf::{LeafVersion, ScriptLeaf},
    tree::{compute_root, ScriptTree},
    tweak::tap_tweak,
};
use tracing::debug;

use crate::errors::{ControlBlockError, ControlBlockResult};

/// The proof that a leaf is committed to in a taproot output key.
///
/// Serialized as `(leaf_version | parity) || internal_key || path[0] || ... || path[m-1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlBlock {
    leaf_version: LeafVersion,
    output_key_parity: Parity,
    internal_key: XOnlyPublicKey,
    merkle_path: Vec<NodeHash>,
}

impl ControlBlock {
    /// Builds the control block for the leaf at `leaf_index`.
    ///
    /// `output_parity` must be the parity of the tweaked output key. Using the parity of the leaf's
    /// own key (or of the internal key) produces a control block that consensus rejects.
    pub fn build(
        internal_key: XOnlyPublicKey,
        tree: &ScriptTree,
        leaf_index: usize,
        output_parity: Parity,
    ) -> TreeResult<Self> {
        let leaf = tree.leaf(leaf_index)?;
        let merkle_path = tree.merkle_path(leaf_index)?;

        Ok(Self {
            leaf_version: leaf.leaf_version(),
            output_key_parity: output_parity,
            internal_key,
            merkle_path,
        })
    }

    /// Returns the version of the leaf this block proves.
    pub const fn leaf_version(&self) -> LeafVersion {
        self.leaf_version
    }

    /// Returns the parity of the output key.
    pub const fn output_key_parity(&self) -> Parity {
        self.output_key_parity
    }

    /// Returns the internal key.
    pub const fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_key
    }

    /// Returns the sibling hashes from the leaf up to the root.
    pub fn merkle_path(&self) -> &[NodeHash] {
        &self.merkle_path
    }

    /// Returns the consensus encoding.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            TAPROOT_CONTROL_BASE_SIZE + TAPROOT_CONTROL_NODE_SIZE * self.merkle_path.len(),
        );

        bytes.push(self.leaf_version.to_consensus() | self.output_key_parity.to_u8());
        bytes.extend_from_slice(&self.internal_key.serialize());
        for node in &self.merkle_path {
            bytes.extend_from_slice(node.as_byte_array());
        }

        bytes
    }

    /// Decodes a control block from its consensus encoding.
    pub fn decode(bytes: &[u8]) -> ControlBlockResult<Self> {
        if bytes.len() < TAPROOT_CONTROL_BASE_SIZE
            || (bytes.len() - TAPROOT_CONTROL_BASE_SIZE) % TAPROOT_CONTROL_NODE_SIZE != 0
        {
            return Err(ControlBlockError::InvalidLength(bytes.len()));
        }

        let num_nodes = (bytes.len() - TAPROOT_CONTROL_BASE_SIZE) / TAPROOT_CONTROL_NODE_SIZE;
        if num_nodes > TAPROOT_CONTROL_MAX_NODE_COUNT {
            return Err(ControlBlockError::TooManyNodes(num_nodes));
        }

        let (header, rest) = bytes.split_at(TAPROOT_CONTROL_BASE_SIZE);

        let leaf_version = LeafVersion::from_consensus(header[0] & TAPROOT_LEAF_MASK)?;
        let output_key_parity = if header[0] & 1 == 1 {
            Parity::Odd
        } else {
            Parity::Even
        };
        let internal_key = XOnlyPublicKey::from_slice(&header[1..])
            .map_err(ControlBlockError::InvalidInternalKey)?;

        let merkle_path = rest
            .chunks_exact(TAPROOT_CONTROL_NODE_SIZE)
            .map(|chunk| {
                let mut node = [0u8; 32];
                node.copy_from_slice(chunk);
                NodeHash::from_byte_array(node)
            })
            .collect();

        Ok(Self {
            leaf_version,
            output_key_parity,
            internal_key,
            merkle_path,
        })
    }

    /// Checks that this block proves `leaf` is committed to in `output_key`.
    ///
    /// The merkle root is recomputed from the leaf hash and the path, the internal key is tweaked
    /// with it and the result must match both `output_key` and the parity bit of this block.
    pub fn verify_commitment(&self, output_key: &XOnlyPublicKey, leaf: &ScriptLeaf) -> bool {
        if leaf.leaf_version() != self.leaf_version {
            return false;
        }

        let root = compute_root(leaf.leaf_hash(), &self.merkle_path);

        match tap_tweak(&self.internal_key, Some(root)) {
            Ok(tweaked) => {
                let key_matches = tweaked.output_key() == *output_key;
                let parity_matches = tweaked.output_parity() == self.output_key_parity;

                if key_matches && !parity_matches {
                    debug!(%output_key, "control block carries the wrong parity bit");
                }

                key_matches && parity_matches
            }
            Err(_) => false,
        }
    }
}
