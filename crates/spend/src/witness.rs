//! Witness assembly.
//!
//! These functions only arrange data. Once a UTXO is spent via one path the other paths stay
//! unrevealed forever, so there is nothing to undo here.

use std::collections::BTreeMap;

use bitcoin::{psbt::Input, Witness};
use taptree_primitives::leaf::ScriptLeaf;

use crate::{control_block::ControlBlock, signer::TaprootSignature};

/// Generic taproot witness data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaprootWitness {
    /// Key-path spend.
    Key {
        /// Signature of the output key.
        signature: TaprootSignature,
    },

    /// Script-path spend.
    ///
    /// The leaf script and control block are supplied by the output.
    Script {
        /// Leaf index.
        leaf_index: usize,

        /// Inputs to the leaf script, bottom of the stack first.
        script_inputs: Vec<Vec<u8>>,
    },
}

/// Assembles the single-element witness of a key-path spend.
pub fn assemble_key_path(signature: &TaprootSignature) -> Witness {
    Witness::from_slice(&[signature.to_vec()])
}

/// Assembles the witness of a script-path spend: `satisfiers ++ [leaf_script, control_block]`.
pub fn assemble_script_path<D>(
    satisfiers: impl IntoIterator<Item = D>,
    leaf: &ScriptLeaf,
    control_block: &ControlBlock,
) -> Witness
where
    D: AsRef<[u8]>,
{
    let mut witness = Witness::new();

    satisfiers
        .into_iter()
        .for_each(|satisfier| witness.push(satisfier));

    witness.push(leaf.script().as_bytes());
    witness.push(control_block.serialize());

    witness
}

/// Arranges the signatures for an `OP_CHECKSIGADD` leaf into its satisfier stack.
///
/// `signatures` holds one entry per key in declaration order, `None` for keys that do not sign.
/// The script consumes the last key's signature first, so the stack is built in reverse order,
/// and absent signers are represented by empty pushes.
pub fn checksigadd_satisfiers(signatures: &[Option<TaprootSignature>]) -> Vec<Vec<u8>> {
    signatures
        .iter()
        .rev()
        .map(|signature| signature.as_ref().map(TaprootSignature::to_vec).unwrap_or_default())
        .collect()
}

/// Finalizes the PSBT `input` with the given witness and clears the fields used for signing.
pub fn finalize_input(input: &mut Input, witness: Witness) {
    // Set final witness
    input.final_script_witness = Some(witness);

    // And clear all other fields as per BIP 174
    input.partial_sigs = BTreeMap::new();
    input.sighash_type = None;
    input.redeem_script = None;
    input.witness_script = None;
    input.bip32_derivation = BTreeMap::new();
    input.tap_key_sig = None;
    input.tap_script_sigs = BTreeMap::new();
    input.tap_scripts = BTreeMap::new();
    input.tap_key_origins = BTreeMap::new();
    input.tap_internal_key = None;
    input.tap_merkle_root = None;
}

#[cfg(test)]
mod tests {
    use bitcoin::{ScriptBuf, TapSighashType};
    use secp256k1::Parity;
    use taptree_primitives::tree::{ScriptTree, TreeSpec};
    use taptree_test_utils::prelude::*;

    use super::*;

    fn signature(sighash_type: TapSighashType) -> TaprootSignature {
        TaprootSignature {
            signature: generate_signature(),
            sighash_type,
        }
    }

    #[test]
    fn key_path_witness_has_one_element() {
        let default = signature(TapSighashType::Default);
        let witness = assemble_key_path(&default);

        assert_eq!(witness.len(), 1);
        assert_eq!(witness.nth(0), Some(default.to_vec().as_slice()));

        let all = signature(TapSighashType::All);
        assert_eq!(assemble_key_path(&all).nth(0).map(<[u8]>::len), Some(65));
    }

    #[test]
    fn script_path_witness_layout() {
        let leaf = ScriptLeaf::new(ScriptBuf::from_bytes(vec![0x51]));
        let other = ScriptLeaf::new(ScriptBuf::from_bytes(vec![0x52]));
        let tree = ScriptTree::build(TreeSpec::pair(leaf.clone().into(), other.into()))
            .expect("valid tree");
        let control_block = ControlBlock::build(generate_xonly_pubkey(), &tree, 0, Parity::Odd)
            .expect("leaf exists");

        let satisfiers = vec![vec![1u8, 2, 3], vec![]];
        let witness = assemble_script_path(&satisfiers, &leaf, &control_block);

        assert_eq!(witness.len(), 4);
        assert_eq!(witness.nth(0), Some(&[1u8, 2, 3][..]));
        assert_eq!(witness.nth(1), Some(&[][..]));
        assert_eq!(witness.nth(2), Some(leaf.script().as_bytes()));
        assert_eq!(witness.last(), Some(control_block.serialize().as_slice()));
        assert_eq!(witness.last().map(|cb| cb[0]), Some(0xc1));
    }

    #[test]
    fn checksigadd_satisfiers_are_reversed() {
        let first = signature(TapSighashType::Default);
        let third = signature(TapSighashType::All);

        let satisfiers = checksigadd_satisfiers(&[Some(first), None, Some(third)]);

        assert_eq!(satisfiers, vec![third.to_vec(), vec![], first.to_vec()]);
    }

    #[test]
    fn finalize_input_clears_signing_fields() {
        let mut input = Input {
            sighash_type: Some(TapSighashType::All.into()),
            tap_internal_key: Some(generate_xonly_pubkey()),
            ..Default::default()
        };
        let witness = assemble_key_path(&signature(TapSighashType::Default));

        finalize_input(&mut input, witness.clone());

        assert_eq!(input.final_script_witness, Some(witness));
        assert!(input.sighash_type.is_none());
        assert!(input.tap_internal_key.is_none());
    }
}
