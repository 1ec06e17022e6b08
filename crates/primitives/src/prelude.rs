//! Commonly used items of this crate.

pub use crate::{
    constants::UNSPENDABLE_INTERNAL_KEY,
    errors::*,
    hashes::{branch_hash, tagged_hash, LeafHash, NodeHash},
    leaf::{LeafVersion, ScriptLeaf},
    scripts::*,
    secp::{parse_secret_key, parse_xonly_key, EvenSecretKey},
    tree::{compute_root, verify_merkle_path, ScriptTree, TreeNode, TreeSpec},
    tweak::{tap_tweak, tap_tweak_keypair, TweakedKey},
};
