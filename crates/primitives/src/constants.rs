//! This module contains constants fixed by BIP341 and BIP342.
//!
//! These values are consensus-critical: changing any of them changes the committed output keys.

use std::sync::LazyLock;

use secp256k1::XOnlyPublicKey;

/// The maximum number of merkle path elements in a control block, i.e. the maximum depth of a
/// script tree.
pub const TAPROOT_CONTROL_MAX_NODE_COUNT: usize = 128;

/// Size of the fixed part of a control block: the version byte and the internal key.
pub const TAPROOT_CONTROL_BASE_SIZE: usize = 33;

/// Size of a single merkle path element in a control block.
pub const TAPROOT_CONTROL_NODE_SIZE: usize = 32;

/// Maximum size of a serialized control block.
pub const TAPROOT_CONTROL_MAX_SIZE: usize =
    TAPROOT_CONTROL_BASE_SIZE + TAPROOT_CONTROL_NODE_SIZE * TAPROOT_CONTROL_MAX_NODE_COUNT;

/// First byte of a taproot annex.
///
/// Leaf versions may not use this value.
pub const TAPROOT_ANNEX_PREFIX: u8 = 0x50;

/// Leaf version of BIP342 tapscript.
pub const TAPSCRIPT_LEAF_VERSION: u8 = 0xc0;

/// Mask that extracts the leaf version from the first byte of a control block.
pub const TAPROOT_LEAF_MASK: u8 = 0xfe;

/// Size of a pay-to-taproot scriptPubKey: `OP_1 OP_PUSHBYTES_32 <32-byte key>`.
pub const P2TR_SCRIPT_PUBKEY_SIZE: usize = 34;

/// The x coordinate of the BIP341 "nothing up my sleeve" point `H`.
///
/// It is the SHA256 of the uncompressed encoding of the secp256k1 generator, so nobody knows its
/// discrete logarithm.
const UNSPENDABLE_PUBLIC_KEY_BYTES: [u8; 32] = [
    0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
    0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
];

/// A verifiably unspendable internal key, used for outputs that can only be spent via the
/// script path.
///
/// This is the point `H` suggested in [BIP-341](https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki#constructing-and-spending-taproot-outputs).
pub static UNSPENDABLE_INTERNAL_KEY: LazyLock<XOnlyPublicKey> = LazyLock::new(|| {
    XOnlyPublicKey::from_slice(&UNSPENDABLE_PUBLIC_KEY_BYTES).expect("valid xonly public key")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspendable_key_is_bip341_h() {
        assert_eq!(
            UNSPENDABLE_INTERNAL_KEY.to_string(),
            "50929b74c1a04954b78b4b6035e97a5e078a5a0f28ec96d547bfee9ace803ac0"
        );
    }

    #[test]
    fn control_block_max_size() {
        assert_eq!(TAPROOT_CONTROL_MAX_SIZE, 4129);
    }
}
