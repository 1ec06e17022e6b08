//! Pre-broadcast self-check.
//!
//! Catches the mistakes that otherwise only surface as a rejected transaction: a tree rebuilt in
//! a different shape, a control block with the wrong parity bit, or a signature made with the
//! wrong key or over the wrong prevouts. This is not a script interpreter: leaves other than a
//! single `<key> OP_CHECKSIG` tapscript are only checked for their commitment.

use bitcoin::{Amount, Script, ScriptBuf, Transaction};
use secp256k1::XOnlyPublicKey;
use taptree_primitives::{
    constants::{P2TR_SCRIPT_PUBKEY_SIZE, TAPROOT_ANNEX_PREFIX},
    leaf::{LeafVersion, ScriptLeaf},
    scripts::p2pk_key,
};
use tracing::{debug, warn};

use crate::{
    control_block::ControlBlock,
    errors::{SighashError, SpendCheckError, SpendCheckResult},
    output::TaprootOutput,
    sighash::{Annex, ScriptPathCommitment, SighashContext},
    signer::TaprootSignature,
};

/// What the self-check was able to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckOutcome {
    /// The signature verifies against the key it must verify against.
    SignatureVerified,

    /// The leaf is committed to in the output key, but its script was not evaluated.
    CommitmentOnly,
}

impl TaprootOutput {
    /// Checks that `funded` is the scriptPubKey of this output.
    pub fn verify_script_pubkey(&self, funded: &Script) -> SpendCheckResult<()> {
        let expected = self.script_pubkey();

        if expected.as_script() != funded {
            warn!(%expected, actual = %funded, "funded scriptPubKey does not match the output");

            return Err(SpendCheckError::ScriptPubKeyMismatch {
                expected,
                actual: funded.to_owned(),
            });
        }

        Ok(())
    }
}

/// Extracts the output key of a pay-to-taproot scriptPubKey.
fn taproot_output_key(script_pubkey: &Script) -> SpendCheckResult<XOnlyPublicKey> {
    if !script_pubkey.is_p2tr() || script_pubkey.len() != P2TR_SCRIPT_PUBKEY_SIZE {
        return Err(SpendCheckError::NotTaproot(script_pubkey.to_owned()));
    }

    XOnlyPublicKey::from_slice(&script_pubkey.as_bytes()[2..])
        .map_err(|_| SpendCheckError::NotTaproot(script_pubkey.to_owned()))
}

/// Checks the witness of `input_index` of a signed transaction before it is broadcast.
///
/// `script_pubkeys` and `amounts` must describe every input of `tx`, in order, exactly as for
/// signing.
pub fn check_spend(
    tx: &Transaction,
    input_index: usize,
    script_pubkeys: &[ScriptBuf],
    amounts: &[Amount],
) -> SpendCheckResult<CheckOutcome> {
    let ctx = SighashContext::new(tx, script_pubkeys, amounts)?;

    let input = tx
        .input
        .get(input_index)
        .ok_or(SighashError::InputIndexOutOfRange {
            index: input_index,
            num_inputs: tx.input.len(),
        })?;
    let output_key = taproot_output_key(&script_pubkeys[input_index])?;

    let mut stack: Vec<&[u8]> = input.witness.iter().collect();

    // the last element is the annex if there are at least two elements and it starts with 0x50
    let annex = match stack.as_slice() {
        [_, .., last] if last.first() == Some(&TAPROOT_ANNEX_PREFIX) => {
            let annex = Annex::new(last.to_vec())?;
            stack.pop();
            Some(annex)
        }
        _ => None,
    };

    match stack.as_slice() {
        [] => Err(SpendCheckError::EmptyWitness),
        [signature] => {
            let signature = TaprootSignature::from_slice(signature)?;
            let sighash = ctx.key_spend(input_index, signature.sighash_type, annex.as_ref())?;

            if !signature.verify(&sighash, &output_key) {
                return Err(SpendCheckError::InvalidSignature);
            }

            debug!(%input_index, "key path signature verified");
            Ok(CheckOutcome::SignatureVerified)
        }
        [satisfiers @ .., script, control_block] => {
            let control_block = ControlBlock::decode(control_block)?;
            let leaf = ScriptLeaf::with_version(
                ScriptBuf::from_bytes(script.to_vec()),
                control_block.leaf_version(),
            );

            if !control_block.verify_commitment(&output_key, &leaf) {
                return Err(SpendCheckError::CommitmentMismatch);
            }

            // only tapscript leaves have BIP342 signature semantics
            let leaf_key = match leaf.leaf_version() {
                LeafVersion::TAPSCRIPT => p2pk_key(leaf.script()),
                _ => None,
            };

            match (leaf_key, satisfiers) {
                (Some(leaf_key), [signature]) => {
                    let signature = TaprootSignature::from_slice(signature)?;
                    let sighash = ctx.script_spend(
                        input_index,
                        signature.sighash_type,
                        annex.as_ref(),
                        ScriptPathCommitment::new(leaf.leaf_hash()),
                    )?;

                    if !signature.verify(&sighash, &leaf_key) {
                        return Err(SpendCheckError::InvalidSignature);
                    }

                    let leaf_hash = leaf.leaf_hash();
                    debug!(%input_index, %leaf_hash, "script path signature verified");
                    Ok(CheckOutcome::SignatureVerified)
                }
                _ => {
                    let leaf_hash = leaf.leaf_hash();
                    debug!(%input_index, %leaf_hash, "script path commitment verified");
                    Ok(CheckOutcome::CommitmentOnly)
                }
            }
        }
    }
}
