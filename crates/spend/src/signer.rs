//! Key-path and script-path signers.
//!
//! Both signers produce BIP340 Schnorr signatures with deterministic nonces and no auxiliary
//! randomness, so signing the same message with the same key twice yields the same signature.

use bitcoin::{Amount, ScriptBuf, TapSighashType, Transaction};
use secp256k1::{schnorr, Keypair, Message, SecretKey, XOnlyPublicKey, SECP256K1};
use taptree_params::prelude::SigningParams;
use taptree_primitives::{
    hashes::NodeHash, leaf::ScriptLeaf, tree::ScriptTree, tweak::tap_tweak_keypair,
};
use tracing::debug;

use crate::{
    errors::{SignResult, SignatureError},
    sighash::{Annex, ScriptPathCommitment, SighashContext, NO_CODE_SEPARATOR},
};

/// A taproot signature together with the sighash type it commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaprootSignature {
    /// The Schnorr signature.
    pub signature: schnorr::Signature,

    /// The sighash type.
    pub sighash_type: TapSighashType,
}

impl TaprootSignature {
    /// Returns the witness encoding: 64 bytes for `SIGHASH_DEFAULT`, 65 bytes otherwise.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut bytes = self.signature.serialize().to_vec();
        if self.sighash_type != TapSighashType::Default {
            bytes.push(self.sighash_type as u8);
        }

        bytes
    }

    /// Parses the witness encoding of a signature.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        match bytes.len() {
            64 => Ok(Self {
                signature: schnorr::Signature::from_slice(bytes)?,
                sighash_type: TapSighashType::Default,
            }),
            65 => {
                let byte = bytes[64];
                // an explicit SIGHASH_DEFAULT byte is not allowed
                let sighash_type = match TapSighashType::from_consensus_u8(byte) {
                    Ok(TapSighashType::Default) | Err(_) => {
                        return Err(SignatureError::InvalidSighashType(byte))
                    }
                    Ok(sighash_type) => sighash_type,
                };

                Ok(Self {
                    signature: schnorr::Signature::from_slice(&bytes[..64])?,
                    sighash_type,
                })
            }
            len => Err(SignatureError::InvalidLength(len)),
        }
    }

    /// Verifies the signature against `key` for the given message.
    pub fn verify(&self, sighash: &Message, key: &XOnlyPublicKey) -> bool {
        SECP256K1.verify_schnorr(&self.signature, sighash, key).is_ok()
    }
}

/// The key a signature is made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningKey {
    /// The internal key, tweaked with the merkle root of the script tree (if any).
    KeyPath {
        /// The merkle root the internal key commits to.
        merkle_root: Option<NodeHash>,
    },

    /// A leaf key, used as is.
    ScriptPath,
}

/// Information that is required to make a signature for a taproot transaction input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigningInfo {
    /// Sighash of the transaction input.
    pub sighash: Message,

    /// The sighash type committed to in `sighash`.
    pub sighash_type: TapSighashType,

    /// How the secret key is turned into the signing key.
    pub key: SigningKey,
}

impl SigningInfo {
    /// Creates a signature for the given signing info.
    ///
    /// Key-path spends negate the secret if its public key has an odd y coordinate and add the
    /// tap tweak. Script-path spends sign with the secret as is. The derived keypair is erased
    /// before returning.
    pub fn sign(self, secret_key: &SecretKey) -> SignResult<TaprootSignature> {
        let mut keypair = match self.key {
            SigningKey::KeyPath { merkle_root } => tap_tweak_keypair(secret_key, merkle_root)?,
            SigningKey::ScriptPath => Keypair::from_secret_key(SECP256K1, secret_key),
        };

        let signature = SECP256K1.sign_schnorr_no_aux_rand(&self.sighash, &keypair);
        keypair.non_secure_erase();

        Ok(TaprootSignature {
            signature,
            sighash_type: self.sighash_type,
        })
    }
}

/// Signs inputs that spend a taproot output via the key path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPathSigner {
    params: SigningParams,
    annex: Option<Annex>,
}

impl KeyPathSigner {
    /// Creates a signer with the given parameters.
    pub const fn new(params: SigningParams) -> Self {
        Self {
            params,
            annex: None,
        }
    }

    /// Commits the signature to an annex.
    pub fn with_annex(mut self, annex: Annex) -> Self {
        self.annex = Some(annex);
        self
    }

    /// Computes the signing info for `input_index`.
    ///
    /// `script_pubkeys` and `amounts` must describe every input of `tx`, in order.
    pub fn signing_info(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkeys: &[ScriptBuf],
        amounts: &[Amount],
        merkle_root: Option<NodeHash>,
    ) -> SignResult<SigningInfo> {
        let sighash_type = self.params.sighash_type();
        let sighash = SighashContext::new(tx, script_pubkeys, amounts)?.key_spend(
            input_index,
            sighash_type,
            self.annex.as_ref(),
        )?;

        Ok(SigningInfo {
            sighash,
            sighash_type,
            key: SigningKey::KeyPath { merkle_root },
        })
    }

    /// Signs `input_index` of `tx` with the internal secret key.
    ///
    /// `tree` must be the same tree the output was created with, or `None` for a key-only output.
    pub fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkeys: &[ScriptBuf],
        amounts: &[Amount],
        internal_secret: &SecretKey,
        tree: Option<&ScriptTree>,
    ) -> SignResult<TaprootSignature> {
        let merkle_root = tree.map(ScriptTree::root_hash);
        let info = self.signing_info(tx, input_index, script_pubkeys, amounts, merkle_root)?;

        debug!(%input_index, sighash_type = ?info.sighash_type, "signing key path");

        info.sign(internal_secret)
    }
}

/// Signs inputs that spend a taproot output via a script leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPathSigner {
    params: SigningParams,
    annex: Option<Annex>,
    code_separator_pos: u32,
}

impl Default for ScriptPathSigner {
    fn default() -> Self {
        Self::new(SigningParams::default())
    }
}

impl ScriptPathSigner {
    /// Creates a signer with the given parameters.
    pub const fn new(params: SigningParams) -> Self {
        Self {
            params,
            annex: None,
            code_separator_pos: NO_CODE_SEPARATOR,
        }
    }

    /// Commits the signature to an annex.
    pub fn with_annex(mut self, annex: Annex) -> Self {
        self.annex = Some(annex);
        self
    }

    /// Commits the signature to the opcode position of the last executed `OP_CODESEPARATOR`.
    pub const fn with_code_separator(mut self, position: u32) -> Self {
        self.code_separator_pos = position;
        self
    }

    /// Computes the signing info for `input_index` executing `leaf`.
    pub fn signing_info(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkeys: &[ScriptBuf],
        amounts: &[Amount],
        leaf: &ScriptLeaf,
    ) -> SignResult<SigningInfo> {
        let sighash_type = self.params.sighash_type();
        let commitment = ScriptPathCommitment {
            leaf_hash: leaf.leaf_hash(),
            code_separator_pos: self.code_separator_pos,
        };

        let sighash = SighashContext::new(tx, script_pubkeys, amounts)?.script_spend(
            input_index,
            sighash_type,
            self.annex.as_ref(),
            commitment,
        )?;

        Ok(SigningInfo {
            sighash,
            sighash_type,
            key: SigningKey::ScriptPath,
        })
    }

    /// Signs `input_index` of `tx` with a key that appears in `leaf`.
    ///
    /// For `OP_CHECKSIGADD` leaves call this once per participating key.
    pub fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkeys: &[ScriptBuf],
        amounts: &[Amount],
        leaf_secret: &SecretKey,
        leaf: &ScriptLeaf,
    ) -> SignResult<TaprootSignature> {
        let info = self.signing_info(tx, input_index, script_pubkeys, amounts, leaf)?;

        let leaf_hash = leaf.leaf_hash();
        debug!(%input_index, %leaf_hash, sighash_type = ?info.sighash_type, "signing script path");

        info.sign(leaf_secret)
    }
}
