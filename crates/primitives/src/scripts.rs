//! Common tapscript leaf templates.
//!
//! These builders only produce scripts; they do not check that the scripts are satisfiable.

use bitcoin::{
    opcodes::{
        all::{
            OP_CHECKSIG, OP_CHECKSIGADD, OP_CHECKSIGVERIFY, OP_CSV, OP_EQUALVERIFY, OP_NUMEQUAL,
            OP_PUSHBYTES_32, OP_SHA256,
        },
        OP_TRUE,
    },
    script::Builder,
    Script, ScriptBuf, Sequence,
};
use secp256k1::XOnlyPublicKey;
use sha2::{Digest, Sha256};

use crate::errors::ScriptError;

/// Creates a leaf that can be spent with a signature for `key`: `<key> OP_CHECKSIG`.
pub fn p2pk_script(key: &XOnlyPublicKey) -> ScriptBuf {
    Builder::new()
        .push_x_only_key(key)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Returns the key of a leaf created by [`p2pk_script`], if `script` is one.
pub fn p2pk_key(script: &Script) -> Option<XOnlyPublicKey> {
    match script.as_bytes() {
        [push, key @ .., checksig]
            if key.len() == 32
                && *push == OP_PUSHBYTES_32.to_u8()
                && *checksig == OP_CHECKSIG.to_u8() =>
        {
            XOnlyPublicKey::from_slice(key).ok()
        }
        _ => None,
    }
}

/// Creates a leaf that can be spent by revealing the preimage of `hash`:
/// `OP_SHA256 <hash> OP_EQUALVERIFY OP_TRUE`.
pub fn hashlock_script(hash: &[u8; 32]) -> ScriptBuf {
    Builder::new()
        .push_opcode(OP_SHA256)
        .push_slice(hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_TRUE)
        .into_script()
}

/// Creates a hashlock leaf for the SHA256 of `preimage`.
pub fn hashlock_for_preimage(preimage: &[u8]) -> ScriptBuf {
    let hash: [u8; 32] = Sha256::digest(preimage).into();

    hashlock_script(&hash)
}

/// Creates a leaf that requires a signature for `key` and a relative timelock:
/// `<key> OP_CHECKSIGVERIFY <sequence> OP_CSV`.
pub fn csv_script(key: &XOnlyPublicKey, sequence: Sequence) -> ScriptBuf {
    Builder::new()
        .push_x_only_key(key)
        .push_opcode(OP_CHECKSIGVERIFY)
        .push_int(sequence.to_consensus_u32() as i64)
        .push_opcode(OP_CSV)
        .into_script()
}

/// Creates a `threshold`-of-`keys.len()` multisig leaf using `OP_CHECKSIGADD`:
/// `<k0> OP_CHECKSIG <k1> OP_CHECKSIGADD ... <threshold> OP_NUMEQUAL`.
///
/// Satisfiers must be pushed in reverse key order, see `checksigadd_satisfiers` in the spend
/// crate.
pub fn checksigadd_script(
    keys: &[XOnlyPublicKey],
    threshold: usize,
) -> Result<ScriptBuf, ScriptError> {
    let Some((first, rest)) = keys.split_first() else {
        return Err(ScriptError::NoKeys);
    };

    if threshold == 0 || threshold > keys.len() {
        return Err(ScriptError::InvalidThreshold {
            threshold,
            num_keys: keys.len(),
        });
    }

    let mut builder = Builder::new().push_x_only_key(first).push_opcode(OP_CHECKSIG);
    for key in rest {
        builder = builder.push_x_only_key(key).push_opcode(OP_CHECKSIGADD);
    }

    Ok(builder
        .push_int(threshold as i64)
        .push_opcode(OP_NUMEQUAL)
        .into_script())
}
