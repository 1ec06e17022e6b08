//! Error types for the tap tree primitives.

use thiserror::Error;

use crate::constants::TAPROOT_CONTROL_MAX_NODE_COUNT;

/// Errors that can occur while building or querying a script tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A group in the tree description does not have exactly two children.
    ///
    /// The tree is never rebalanced automatically since that would silently change the
    /// committed root.
    #[error("a tree group must have exactly two children, got {0}")]
    InvalidGroupSize(usize),

    /// The tree is deeper than a control block can prove.
    #[error("tree depth {0} exceeds the maximum of {TAPROOT_CONTROL_MAX_NODE_COUNT}")]
    TooDeep(usize),

    /// No leaf exists at the given index.
    #[error("no leaf at index {index}, the tree has {num_leaves} leaves")]
    LeafNotFound {
        /// The requested leaf index.
        index: usize,

        /// The number of leaves in the tree.
        num_leaves: usize,
    },
}

/// Wrapper type for results that can fail with a [`TreeError`].
pub type TreeResult<T> = Result<T, TreeError>;

/// Error while creating a leaf version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LeafVersionError {
    /// Leaf versions must be even: the low bit of the control block byte stores the parity.
    #[error("leaf version {0:#04x} is odd")]
    Odd(u8),

    /// `0x50` is reserved for the annex.
    #[error("leaf version 0x50 collides with the annex prefix")]
    AnnexPrefix,
}

/// Errors that can occur while tweaking a key.
///
/// All variants are cryptographically negligible for honestly generated keys; they are fatal and
/// must not be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TweakError {
    /// The tweak hash is zero.
    #[error("tap tweak is zero")]
    ZeroTweak,

    /// The tweak hash is not smaller than the curve order.
    #[error("tap tweak is not below the curve order")]
    TweakOutOfRange,

    /// The tweaked point (or tweaked secret) is the point at infinity (or zero).
    #[error("tweaked key is the point at infinity")]
    PointAtInfinity,
}

/// Errors that can occur while parsing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The encoding is neither 32 (x-only) nor 33 (compressed) bytes long.
    #[error("invalid public key length {0}, expected 32 or 33 bytes")]
    InvalidPublicKeyLength(usize),

    /// The bytes do not encode a valid key.
    #[error("invalid key: {0}")]
    Secp(#[from] secp256k1::Error),
}

/// Errors that can occur while building leaf scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// A multisig leaf needs at least one key.
    #[error("a multisig leaf needs at least one key")]
    NoKeys,

    /// The threshold must be between one and the number of keys.
    #[error("invalid threshold {threshold} for {num_keys} keys")]
    InvalidThreshold {
        /// The requested threshold.
        threshold: usize,

        /// The number of keys in the leaf.
        num_keys: usize,
    },
}
