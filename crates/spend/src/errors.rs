//! Error types for building and spending taproot outputs.

use bitcoin::ScriptBuf;
use taptree_primitives::errors::{LeafVersionError, TreeError, TweakError};
use thiserror::Error;

/// Errors that can occur while computing a signature message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SighashError {
    /// The input being signed does not exist.
    #[error("input index {index} out of range, the transaction has {num_inputs} inputs")]
    InputIndexOutOfRange {
        /// The requested input index.
        index: usize,

        /// The number of inputs in the transaction.
        num_inputs: usize,
    },

    /// Fewer scriptPubKeys than transaction inputs were supplied.
    #[error("expected a scriptPubKey for each of the {expected} inputs, got {got}")]
    MissingScript {
        /// The number of transaction inputs.
        expected: usize,

        /// The number of supplied scriptPubKeys.
        got: usize,
    },

    /// Fewer amounts than transaction inputs were supplied.
    #[error("expected an amount for each of the {expected} inputs, got {got}")]
    MissingAmount {
        /// The number of transaction inputs.
        expected: usize,

        /// The number of supplied amounts.
        got: usize,
    },

    /// More scriptPubKeys than transaction inputs were supplied.
    #[error("expected a scriptPubKey for each of the {expected} inputs, got {got}")]
    ExtraScripts {
        /// The number of transaction inputs.
        expected: usize,

        /// The number of supplied scriptPubKeys.
        got: usize,
    },

    /// More amounts than transaction inputs were supplied.
    #[error("expected an amount for each of the {expected} inputs, got {got}")]
    ExtraAmounts {
        /// The number of transaction inputs.
        expected: usize,

        /// The number of supplied amounts.
        got: usize,
    },

    /// `SIGHASH_SINGLE` was requested for an input that has no output at the same index.
    #[error("SIGHASH_SINGLE on input {index} but the transaction has {num_outputs} outputs")]
    SingleWithoutOutput {
        /// The input index.
        index: usize,

        /// The number of outputs in the transaction.
        num_outputs: usize,
    },

    /// The annex does not start with `0x50`.
    #[error("annex must start with 0x50")]
    InvalidAnnex,
}

/// Wrapper type for results that can fail with a [`SighashError`].
pub type SighashResult<T> = Result<T, SighashError>;

/// Errors that can occur while signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The signature message could not be computed.
    #[error("sighash: {0}")]
    Sighash(#[from] SighashError),

    /// The signing key could not be tweaked.
    #[error("tweak: {0}")]
    Tweak(#[from] TweakError),
}

/// Wrapper type for results that can fail with a [`SignError`].
pub type SignResult<T> = Result<T, SignError>;

/// Errors that can occur while parsing a taproot signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The signature is neither 64 nor 65 bytes long.
    #[error("invalid signature length {0}, expected 64 or 65 bytes")]
    InvalidLength(usize),

    /// The trailing sighash byte is not a valid taproot sighash type.
    ///
    /// An explicit `0x00` byte is invalid: `SIGHASH_DEFAULT` is expressed by omitting the byte.
    #[error("invalid sighash type {0:#04x}")]
    InvalidSighashType(u8),

    /// The first 64 bytes are not a valid Schnorr signature.
    #[error("invalid schnorr signature: {0}")]
    Secp(#[from] secp256k1::Error),
}

/// Errors that can occur while decoding a control block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlBlockError {
    /// The length is not `33 + 32 * m`.
    #[error("invalid control block length {0}")]
    InvalidLength(usize),

    /// The merkle path is longer than allowed.
    #[error("control block has {0} path elements, more than allowed")]
    TooManyNodes(usize),

    /// The leaf version is invalid.
    #[error("invalid leaf version: {0}")]
    InvalidLeafVersion(#[from] LeafVersionError),

    /// The internal key is not a valid x-only key.
    #[error("invalid internal key: {0}")]
    InvalidInternalKey(secp256k1::Error),
}

/// Wrapper type for results that can fail with a [`ControlBlockError`].
pub type ControlBlockResult<T> = Result<T, ControlBlockError>;

/// Errors that can occur while constructing or finalizing an output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The internal key could not be tweaked.
    #[error("tweak: {0}")]
    Tweak(#[from] TweakError),

    /// The requested leaf does not exist.
    #[error("tree: {0}")]
    Tree(#[from] TreeError),

    /// A script-path operation was requested on an output without a script tree.
    #[error("output has no script tree")]
    NoScriptTree,
}

/// Wrapper type for results that can fail with an [`OutputError`].
pub type OutputResult<T> = Result<T, OutputError>;

/// Problems found by the pre-broadcast self-check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpendCheckError {
    /// The scriptPubKey the output was funded with differs from the recomputed one.
    #[error("scriptPubKey mismatch: expected {expected}, got {actual}")]
    ScriptPubKeyMismatch {
        /// The recomputed scriptPubKey.
        expected: ScriptBuf,

        /// The scriptPubKey found on chain or supplied by the caller.
        actual: ScriptBuf,
    },

    /// The spent scriptPubKey is not a pay-to-taproot output.
    #[error("scriptPubKey {0} is not a taproot output")]
    NotTaproot(ScriptBuf),

    /// The input carries no witness.
    #[error("witness is empty")]
    EmptyWitness,

    /// The signature could not be parsed.
    #[error("signature: {0}")]
    Signature(#[from] SignatureError),

    /// The Schnorr signature does not verify against the expected key.
    #[error("signature does not verify")]
    InvalidSignature,

    /// The control block could not be decoded.
    #[error("control block: {0}")]
    ControlBlock(#[from] ControlBlockError),

    /// The control block does not prove that the leaf is committed to in the output key.
    #[error("control block does not commit to the leaf")]
    CommitmentMismatch,

    /// The signature message could not be computed.
    #[error("sighash: {0}")]
    Sighash(#[from] SighashError),
}

/// Wrapper type for results that can fail with a [`SpendCheckError`].
pub type SpendCheckResult<T> = Result<T, SpendCheckError>;
