//! Commonly used items of this crate.

pub use crate::{
    check::{check_spend, CheckOutcome},
    control_block::ControlBlock,
    errors::*,
    output::{OutputKind, TaprootOutput},
    sighash::{Annex, ScriptPathCommitment, SighashContext, NO_CODE_SEPARATOR},
    signer::{KeyPathSigner, ScriptPathSigner, SigningInfo, SigningKey, TaprootSignature},
    witness::{
        assemble_key_path, assemble_script_path, checksigadd_satisfiers, finalize_input,
        TaprootWitness,
    },
};
