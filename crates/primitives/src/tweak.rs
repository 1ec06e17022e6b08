//! Key tweaking as described in BIP341.
//!
//! The output key is `Q = P + t*G` where `P` is the even-y lift of the internal key and
//! `t = TaggedHash("TapTweak", P.x || merkle_root)`. Without a script tree the merkle root is
//! left out of the hash entirely, which is not the same as hashing 32 zero bytes.

use secp256k1::{Keypair, Parity, Scalar, SecretKey, XOnlyPublicKey, SECP256K1};
use tracing::debug;

use crate::{
    errors::TweakError,
    hashes::{NodeHash, TaggedHasher, TAP_TWEAK_TAG},
    secp::EvenSecretKey,
};

/// The result of tweaking an internal key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweakedKey {
    output_key: XOnlyPublicKey,
    output_parity: Parity,
    tweak: [u8; 32],
}

impl TweakedKey {
    /// The x-only output key committed to in the scriptPubKey.
    pub const fn output_key(&self) -> XOnlyPublicKey {
        self.output_key
    }

    /// The parity of the y coordinate of the full output point.
    ///
    /// Control blocks must carry this parity, not the parity of any leaf key.
    pub const fn output_parity(&self) -> Parity {
        self.output_parity
    }

    /// The big-endian encoding of the tweak scalar `t`.
    pub const fn tweak(&self) -> [u8; 32] {
        self.tweak
    }
}

/// Computes the raw tweak hash for an internal key and an optional merkle root.
pub fn tweak_hash(internal_key: &XOnlyPublicKey, merkle_root: Option<NodeHash>) -> [u8; 32] {
    let mut hasher = TaggedHasher::new(TAP_TWEAK_TAG);
    hasher.update(internal_key.serialize());

    if let Some(root) = merkle_root {
        hasher.update(root);
    }

    hasher.finalize()
}

/// Converts a tweak hash into a scalar, rejecting zero and values not below the curve order.
fn tweak_scalar(hash: [u8; 32]) -> Result<Scalar, TweakError> {
    if hash == [0u8; 32] {
        return Err(TweakError::ZeroTweak);
    }

    Scalar::from_be_bytes(hash).map_err(|_| TweakError::TweakOutOfRange)
}

/// Tweaks `internal_key` with the optional merkle root.
///
/// # Errors
///
/// Fails if the tweak is zero, not below the curve order, or if the tweaked point is the point
/// at infinity. These are fatal: retrying with the same inputs yields the same result.
pub fn tap_tweak(
    internal_key: &XOnlyPublicKey,
    merkle_root: Option<NodeHash>,
) -> Result<TweakedKey, TweakError> {
    let tweak_bytes = tweak_hash(internal_key, merkle_root);
    let tweak = tweak_scalar(tweak_bytes)?;

    let (output_key, output_parity) = internal_key
        .add_tweak(SECP256K1, &tweak)
        .map_err(|_| TweakError::PointAtInfinity)?;

    debug!(
        %internal_key,
        %output_key,
        ?output_parity,
        has_tree = %merkle_root.is_some(),
        "tweaked internal key"
    );

    Ok(TweakedKey {
        output_key,
        output_parity,
        tweak: tweak_bytes,
    })
}

/// Tweaks a secret key so that it signs for the output key of its x-only public key.
///
/// The secret is first negated if its public key has an odd y coordinate, then the tweak is added
/// modulo the curve order. Intermediate copies of the secret are erased before returning; callers
/// should erase the returned keypair once they are done with it.
pub fn tap_tweak_keypair(
    secret_key: &SecretKey,
    merkle_root: Option<NodeHash>,
) -> Result<Keypair, TweakError> {
    let even_secret = EvenSecretKey::from(*secret_key);
    let (internal_key, _) = even_secret.x_only_public_key(SECP256K1);

    let tweak = tweak_scalar(tweak_hash(&internal_key, merkle_root))?;

    let mut tweaked_secret = even_secret
        .add_tweak(&tweak)
        .map_err(|_| TweakError::PointAtInfinity)?;

    let keypair = Keypair::from_secret_key(SECP256K1, &tweaked_secret);
    tweaked_secret.non_secure_erase();

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        hashes::Hash,
        key::{TapTweak, UntweakedKeypair},
        TapNodeHash,
    };
    use proptest::prelude::*;

    use super::*;

    prop_compose! {
        fn arb_secret_key()(bytes in any::<[u8; 32]>()) -> SecretKey {
            SecretKey::from_slice(&bytes).unwrap_or_else(|_| SecretKey::from_slice(&[1; 32]).expect("valid key"))
        }
    }

    fn arb_merkle_root() -> impl Strategy<Value = Option<NodeHash>> {
        proptest::option::of(any::<[u8; 32]>().prop_map(NodeHash::from_byte_array))
    }

    #[test]
    fn empty_root_differs_from_zero_root() {
        let secret_key = SecretKey::from_slice(&[7; 32]).expect("valid key");
        let (internal_key, _) = secret_key.x_only_public_key(SECP256K1);

        assert_ne!(
            tweak_hash(&internal_key, None),
            tweak_hash(&internal_key, Some(NodeHash::from_byte_array([0; 32])))
        );
    }

    #[test]
    fn tweak_scalar_bounds() {
        assert_eq!(tweak_scalar([0; 32]).err(), Some(TweakError::ZeroTweak));
        assert_eq!(
            tweak_scalar([0xff; 32]).err(),
            Some(TweakError::TweakOutOfRange)
        );
        assert!(tweak_scalar([1; 32]).is_ok());
    }

    proptest! {
        #[test]
        fn output_key_matches_bitcoin(secret_key in arb_secret_key(), merkle_root in arb_merkle_root()) {
            let (internal_key, _) = secret_key.x_only_public_key(SECP256K1);
            let tweaked = tap_tweak(&internal_key, merkle_root).expect("tweak must succeed");

            let bitcoin_root = merkle_root.map(|root| TapNodeHash::from_byte_array(root.to_byte_array()));
            let (expected_key, expected_parity) = internal_key.tap_tweak(SECP256K1, bitcoin_root);

            prop_assert_eq!(tweaked.output_key(), expected_key.to_x_only_public_key());
            prop_assert_eq!(tweaked.output_parity(), expected_parity);
        }

        #[test]
        fn tweaked_keypair_matches_output_key(secret_key in arb_secret_key(), merkle_root in arb_merkle_root()) {
            let (internal_key, _) = secret_key.x_only_public_key(SECP256K1);
            let tweaked = tap_tweak(&internal_key, merkle_root).expect("tweak must succeed");

            let keypair = tap_tweak_keypair(&secret_key, merkle_root).expect("tweak must succeed");
            let (signing_key, parity) = keypair.x_only_public_key();

            prop_assert_eq!(signing_key, tweaked.output_key());
            prop_assert_eq!(parity, tweaked.output_parity());

            let bitcoin_root = merkle_root.map(|root| TapNodeHash::from_byte_array(root.to_byte_array()));
            let expected = UntweakedKeypair::from_secret_key(SECP256K1, &secret_key)
                .tap_tweak(SECP256K1, bitcoin_root)
                .to_keypair();
            prop_assert_eq!(keypair.secret_bytes(), expected.secret_bytes());
        }
    }
}
