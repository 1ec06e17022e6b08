//! Proptest strategies.

use bitcoin::ScriptBuf;
use proptest::prelude::*;
use secp256k1::{SecretKey, XOnlyPublicKey, SECP256K1};
use taptree_primitives::{leaf::ScriptLeaf, tree::TreeSpec};

/// Maximum depth of generated trees.
const MAX_TREE_DEPTH: u32 = 6;

/// Strategy for a valid secret key.
pub fn arb_secret_key() -> impl Strategy<Value = SecretKey> {
    any::<[u8; 32]>().prop_filter_map("not a valid secret key", |bytes| {
        SecretKey::from_slice(&bytes).ok()
    })
}

/// Strategy for an x-only public key with a known discrete log.
pub fn arb_xonly_pubkey() -> impl Strategy<Value = XOnlyPublicKey> {
    arb_secret_key().prop_map(|sk| sk.x_only_public_key(SECP256K1).0)
}

/// Strategy for a tapscript leaf with arbitrary script bytes.
pub fn arb_script_leaf() -> impl Strategy<Value = ScriptLeaf> {
    prop::collection::vec(any::<u8>(), 0..64)
        .prop_map(|bytes| ScriptLeaf::new(ScriptBuf::from_bytes(bytes)))
}

/// Strategy for a binary tree descriptor of at most [`MAX_TREE_DEPTH`] levels.
pub fn arb_tree_spec() -> impl Strategy<Value = TreeSpec> {
    arb_script_leaf()
        .prop_map(TreeSpec::from)
        .prop_recursive(MAX_TREE_DEPTH, 32, 2, |inner| {
            (inner.clone(), inner).prop_map(|(left, right)| TreeSpec::pair(left, right))
        })
}
