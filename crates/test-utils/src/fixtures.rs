//! Fixtures that would be tedious to find by hand.

use secp256k1::{Parity, SecretKey, XOnlyPublicKey, SECP256K1};
use taptree_primitives::{
    leaf::ScriptLeaf,
    scripts::p2pk_script,
    tree::{ScriptTree, TreeSpec},
    tweak::{tap_tweak, TweakedKey},
};

use crate::bitcoin::{generate_secret_key, generate_xonly_pubkey};

/// An output whose output key parity differs from both the internal key parity and the parity of
/// the key in its first leaf.
///
/// A control block that carries the parity of the internal key, or of the leaf key, instead of the
/// parity of the output key is rejected for this output. The tree has a `<key> OP_CHECKSIG` leaf
/// for `leaf_secret` at index 0 and an unrelated leaf at index 1.
#[derive(Debug, Clone)]
pub struct ParityMismatch {
    /// Secret of the internal key.
    pub internal_secret: SecretKey,

    /// Secret of the key in leaf 0.
    pub leaf_secret: SecretKey,

    /// The script tree.
    pub tree: ScriptTree,

    /// The tweaked output key.
    pub tweaked: TweakedKey,
}

impl ParityMismatch {
    /// Returns the internal key.
    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_secret.x_only_public_key(SECP256K1).0
    }

    /// Returns the parity of the full internal public key.
    pub fn internal_parity(&self) -> Parity {
        self.internal_secret.x_only_public_key(SECP256K1).1
    }

    /// Returns the parity of the full leaf public key.
    pub fn leaf_parity(&self) -> Parity {
        self.leaf_secret.x_only_public_key(SECP256K1).1
    }

    /// Returns the leaf that `leaf_secret` can satisfy.
    pub fn leaf(&self) -> &ScriptLeaf {
        self.tree.leaf(0).expect("fixture tree has two leaves")
    }
}

/// Searches random keys until the output key parity differs from the internal and leaf key
/// parities.
///
/// Each attempt succeeds with probability one quarter.
pub fn parity_mismatch_fixture() -> ParityMismatch {
    let leaf_secret = generate_secret_key();
    let (leaf_key, leaf_parity) = leaf_secret.x_only_public_key(SECP256K1);
    let tree = ScriptTree::build(TreeSpec::pair(
        ScriptLeaf::new(p2pk_script(&leaf_key)).into(),
        ScriptLeaf::new(p2pk_script(&generate_xonly_pubkey())).into(),
    ))
    .expect("a pair of leaves is a valid tree");

    loop {
        let internal_secret = generate_secret_key();
        let (internal_key, internal_parity) = internal_secret.x_only_public_key(SECP256K1);
        let tweaked =
            tap_tweak(&internal_key, Some(tree.root_hash())).expect("random keys tweak fine");

        if internal_parity == leaf_parity && tweaked.output_parity() != internal_parity {
            return ParityMismatch {
                internal_secret,
                leaf_secret,
                tree,
                tweaked,
            };
        }
    }
}

/// A key holder `k1` funds an output whose only leaf is `<xonly(k2)> OP_CHECKSIG`.
#[derive(Debug, Clone)]
pub struct EndToEnd {
    /// `k1`, the internal key secret.
    pub internal_secret: SecretKey,

    /// `k2`, the leaf key secret.
    pub leaf_secret: SecretKey,

    /// The single-leaf tree.
    pub tree: ScriptTree,
}

impl EndToEnd {
    /// Returns the internal key.
    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_secret.x_only_public_key(SECP256K1).0
    }

    /// Returns the only leaf.
    pub fn leaf(&self) -> &ScriptLeaf {
        self.tree.leaf(0).expect("fixture tree has one leaf")
    }
}

/// Builds a fresh [`EndToEnd`] fixture from random keys.
pub fn end_to_end_fixture() -> EndToEnd {
    let internal_secret = generate_secret_key();
    let leaf_secret = generate_secret_key();
    let leaf_key = leaf_secret.x_only_public_key(SECP256K1).0;

    EndToEnd {
        internal_secret,
        leaf_secret,
        tree: ScriptTree::from_leaf(ScriptLeaf::new(p2pk_script(&leaf_key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_parities_differ() {
        let fixture = parity_mismatch_fixture();

        assert_ne!(fixture.internal_parity(), fixture.tweaked.output_parity());
        assert_ne!(fixture.leaf_parity(), fixture.tweaked.output_parity());
        assert_eq!(
            tap_tweak(&fixture.internal_key(), Some(fixture.tree.root_hash())),
            Ok(fixture.tweaked)
        );
    }
}
