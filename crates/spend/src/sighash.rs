//! BIP341 signature messages.
//!
//! The message commits to every prevout's amount and scriptPubKey, so callers must supply both
//! for all inputs of the transaction, in input order. This holds for every sighash type,
//! including `ANYONECANPAY`: a short list is always a caller bug.

use bitcoin::{consensus, Amount, ScriptBuf, TapSighashType, Transaction};
use secp256k1::Message;
use sha2::{Digest, Sha256};
use taptree_primitives::{
    constants::TAPROOT_ANNEX_PREFIX,
    hashes::{LeafHash, TaggedHasher, TAP_SIGHASH_TAG},
};
use tracing::trace;

use crate::errors::{SighashError, SighashResult};

/// Code separator position used when no `OP_CODESEPARATOR` was executed.
pub const NO_CODE_SEPARATOR: u32 = u32::MAX;

/// Sighash epoch, prepended to every taproot signature message.
const SIGHASH_EPOCH: u8 = 0x00;

/// Key version of BIP342 tapscript signatures.
const KEY_VERSION_0: u8 = 0x00;

const SIGHASH_ANYONECANPAY: u8 = 0x80;
const SIGHASH_OUTPUT_MASK: u8 = 0x03;
const SIGHASH_NONE: u8 = 0x02;
const SIGHASH_SINGLE: u8 = 0x03;

/// A taproot annex: the last witness element when it starts with `0x50`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annex(Vec<u8>);

impl Annex {
    /// Creates an annex, checking the prefix byte.
    pub fn new(bytes: Vec<u8>) -> SighashResult<Self> {
        match bytes.first() {
            Some(&TAPROOT_ANNEX_PREFIX) => Ok(Self(bytes)),
            _ => Err(SighashError::InvalidAnnex),
        }
    }

    /// Returns the annex bytes, including the prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The script-path part of a signature message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptPathCommitment {
    /// Hash of the leaf being executed.
    pub leaf_hash: LeafHash,

    /// Opcode position of the last executed `OP_CODESEPARATOR`, or [`NO_CODE_SEPARATOR`].
    pub code_separator_pos: u32,
}

impl ScriptPathCommitment {
    /// Commits to `leaf_hash` without a code separator.
    pub const fn new(leaf_hash: LeafHash) -> Self {
        Self {
            leaf_hash,
            code_separator_pos: NO_CODE_SEPARATOR,
        }
    }
}

/// Everything needed to compute signature messages for the inputs of a transaction.
#[derive(Debug, Clone, Copy)]
pub struct SighashContext<'a> {
    tx: &'a Transaction,
    script_pubkeys: &'a [ScriptBuf],
    amounts: &'a [Amount],
}

impl<'a> SighashContext<'a> {
    /// Creates a context after checking that exactly one scriptPubKey and one amount were supplied
    /// for every input.
    pub fn new(
        tx: &'a Transaction,
        script_pubkeys: &'a [ScriptBuf],
        amounts: &'a [Amount],
    ) -> SighashResult<Self> {
        let num_inputs = tx.input.len();

        match amounts.len() {
            got if got < num_inputs => {
                return Err(SighashError::MissingAmount {
                    expected: num_inputs,
                    got,
                })
            }
            got if got > num_inputs => {
                return Err(SighashError::ExtraAmounts {
                    expected: num_inputs,
                    got,
                })
            }
            _ => {}
        }

        match script_pubkeys.len() {
            got if got < num_inputs => {
                return Err(SighashError::MissingScript {
                    expected: num_inputs,
                    got,
                })
            }
            got if got > num_inputs => {
                return Err(SighashError::ExtraScripts {
                    expected: num_inputs,
                    got,
                })
            }
            _ => {}
        }

        Ok(Self {
            tx,
            script_pubkeys,
            amounts,
        })
    }

    /// Returns the transaction.
    pub const fn tx(&self) -> &'a Transaction {
        self.tx
    }

    /// Computes the signature message for a key-path spend of `input_index`.
    pub fn key_spend(
        &self,
        input_index: usize,
        sighash_type: TapSighashType,
        annex: Option<&Annex>,
    ) -> SighashResult<Message> {
        self.signature_hash(input_index, sighash_type, annex, None)
    }

    /// Computes the signature message for a script-path spend of `input_index`.
    pub fn script_spend(
        &self,
        input_index: usize,
        sighash_type: TapSighashType,
        annex: Option<&Annex>,
        commitment: ScriptPathCommitment,
    ) -> SighashResult<Message> {
        self.signature_hash(input_index, sighash_type, annex, Some(commitment))
    }

    /// Computes `TaggedHash("TapSighash", 0x00 || SigMsg(hash_type, ext_flag) || ext)`.
    pub fn signature_hash(
        &self,
        input_index: usize,
        sighash_type: TapSighashType,
        annex: Option<&Annex>,
        script_path: Option<ScriptPathCommitment>,
    ) -> SighashResult<Message> {
        let tx = self.tx;
        let input = tx
            .input
            .get(input_index)
            .ok_or(SighashError::InputIndexOutOfRange {
                index: input_index,
                num_inputs: tx.input.len(),
            })?;

        let hash_type = sighash_type as u8;
        let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
        let output_type = hash_type & SIGHASH_OUTPUT_MASK;

        let mut hasher = TaggedHasher::new(TAP_SIGHASH_TAG);
        hasher.update([SIGHASH_EPOCH]);

        // transaction data
        hasher.update([hash_type]);
        hasher.update(consensus::serialize(&tx.version));
        hasher.update(consensus::serialize(&tx.lock_time));

        if !anyone_can_pay {
            hasher.update(self.sha_prevouts());
            hasher.update(self.sha_amounts());
            hasher.update(self.sha_script_pubkeys());
            hasher.update(self.sha_sequences());
        }

        if output_type != SIGHASH_NONE && output_type != SIGHASH_SINGLE {
            hasher.update(sha256_concat(tx.output.iter().map(consensus::serialize)));
        }

        // data about this input
        let ext_flag = u8::from(script_path.is_some());
        let spend_type = ext_flag * 2 + u8::from(annex.is_some());
        hasher.update([spend_type]);

        if anyone_can_pay {
            hasher.update(consensus::serialize(&input.previous_output));
            hasher.update(self.amounts[input_index].to_sat().to_le_bytes());
            hasher.update(consensus::serialize(&self.script_pubkeys[input_index]));
            hasher.update(consensus::serialize(&input.sequence));
        } else {
            hasher.update((input_index as u32).to_le_bytes());
        }

        if let Some(annex) = annex {
            hasher.update(Sha256::digest(consensus::serialize(&annex.0)));
        }

        // data about this output
        if output_type == SIGHASH_SINGLE {
            let output = tx
                .output
                .get(input_index)
                .ok_or(SighashError::SingleWithoutOutput {
                    index: input_index,
                    num_outputs: tx.output.len(),
                })?;

            hasher.update(Sha256::digest(consensus::serialize(output)));
        }

        if let Some(commitment) = script_path {
            hasher.update(commitment.leaf_hash);
            hasher.update([KEY_VERSION_0]);
            hasher.update(commitment.code_separator_pos.to_le_bytes());
        }

        let sighash = Message::from_digest(hasher.finalize());
        trace!(
            %input_index,
            ?sighash_type,
            script_path = %script_path.is_some(),
            %sighash,
            "computed taproot sighash"
        );

        Ok(sighash)
    }

    fn sha_prevouts(&self) -> [u8; 32] {
        sha256_concat(
            self.tx
                .input
                .iter()
                .map(|input| consensus::serialize(&input.previous_output)),
        )
    }

    fn sha_amounts(&self) -> [u8; 32] {
        sha256_concat(
            self.amounts
                .iter()
                .map(|amount| amount.to_sat().to_le_bytes()),
        )
    }

    fn sha_script_pubkeys(&self) -> [u8; 32] {
        sha256_concat(
            self.script_pubkeys.iter().map(consensus::serialize),
        )
    }

    fn sha_sequences(&self) -> [u8; 32] {
        sha256_concat(
            self.tx
                .input
                .iter()
                .map(|input| input.sequence.to_consensus_u32().to_le_bytes()),
        )
    }
}

fn sha256_concat<T: AsRef<[u8]>>(items: impl IntoIterator<Item = T>) -> [u8; 32] {
    let mut engine = Sha256::new();
    for item in items {
        engine.update(item);
    }

    engine.finalize().into()
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        hashes::Hash,
        sighash::{self, Prevouts, SighashCache},
        taproot::TapLeafHash,
        TxOut,
    };
    use proptest::prelude::*;
    use taptree_test_utils::prelude::*;

    use super::*;

    const ALL_SIGHASH_TYPES: [TapSighashType; 7] = [
        TapSighashType::Default,
        TapSighashType::All,
        TapSighashType::None,
        TapSighashType::Single,
        TapSighashType::AllPlusAnyoneCanPay,
        TapSighashType::NonePlusAnyoneCanPay,
        TapSighashType::SinglePlusAnyoneCanPay,
    ];

    fn prevouts(script_pubkeys: &[ScriptBuf], amounts: &[Amount]) -> Vec<TxOut> {
        script_pubkeys
            .iter()
            .zip(amounts)
            .map(|(script_pubkey, value)| TxOut {
                script_pubkey: script_pubkey.clone(),
                value: *value,
            })
            .collect()
    }

    #[test]
    fn short_input_lists_are_rejected() {
        let tx = generate_tx(3, 1);
        let (script_pubkeys, amounts) = generate_prevouts(3);

        assert_eq!(
            SighashContext::new(&tx, &script_pubkeys, &amounts[..2]).err(),
            Some(SighashError::MissingAmount {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            SighashContext::new(&tx, &script_pubkeys[..1], &amounts).err(),
            Some(SighashError::MissingScript {
                expected: 3,
                got: 1
            })
        );
    }

    #[test]
    fn long_input_lists_are_rejected() {
        let tx = generate_tx(2, 1);
        let (script_pubkeys, amounts) = generate_prevouts(3);

        assert_eq!(
            SighashContext::new(&tx, &script_pubkeys[..2], &amounts).err(),
            Some(SighashError::ExtraAmounts {
                expected: 2,
                got: 3
            })
        );
        assert_eq!(
            SighashContext::new(&tx, &script_pubkeys, &amounts[..2]).err(),
            Some(SighashError::ExtraScripts {
                expected: 2,
                got: 3
            })
        );

        // bitcoin rejects the same prevouts
        let txouts = prevouts(&script_pubkeys, &amounts);
        assert!(SighashCache::new(&tx)
            .taproot_key_spend_signature_hash(0, &Prevouts::All(&txouts), TapSighashType::Default)
            .is_err());
    }

    #[test]
    fn out_of_range_input_is_rejected() {
        let tx = generate_tx(2, 2);
        let (script_pubkeys, amounts) = generate_prevouts(2);
        let ctx = SighashContext::new(&tx, &script_pubkeys, &amounts).expect("lists are complete");

        assert_eq!(
            ctx.key_spend(2, TapSighashType::Default, None),
            Err(SighashError::InputIndexOutOfRange {
                index: 2,
                num_inputs: 2
            })
        );
    }

    #[test]
    fn single_without_output_is_rejected() {
        let tx = generate_tx(3, 1);
        let (script_pubkeys, amounts) = generate_prevouts(3);
        let ctx = SighashContext::new(&tx, &script_pubkeys, &amounts).expect("lists are complete");

        assert!(ctx.key_spend(0, TapSighashType::Single, None).is_ok());
        assert_eq!(
            ctx.key_spend(2, TapSighashType::SinglePlusAnyoneCanPay, None),
            Err(SighashError::SingleWithoutOutput {
                index: 2,
                num_outputs: 1
            })
        );
    }

    #[test]
    fn annex_prefix_is_checked() {
        assert_eq!(Annex::new(vec![]), Err(SighashError::InvalidAnnex));
        assert_eq!(Annex::new(vec![0x51, 1]), Err(SighashError::InvalidAnnex));
        assert!(Annex::new(vec![TAPROOT_ANNEX_PREFIX]).is_ok());
    }

    #[test]
    fn annex_changes_sighash() {
        let tx = generate_tx(1, 1);
        let (script_pubkeys, amounts) = generate_prevouts(1);
        let ctx = SighashContext::new(&tx, &script_pubkeys, &amounts).expect("lists are complete");
        let annex = Annex::new(vec![TAPROOT_ANNEX_PREFIX, 1, 2, 3]).expect("valid annex");

        assert_ne!(
            ctx.key_spend(0, TapSighashType::Default, None),
            ctx.key_spend(0, TapSighashType::Default, Some(&annex))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn key_spend_matches_bitcoin(
            num_inputs in 1usize..5,
            num_outputs in 1usize..5,
            type_index in 0usize..ALL_SIGHASH_TYPES.len(),
            with_annex in any::<bool>(),
        ) {
            let tx = generate_tx(num_inputs, num_outputs);
            let (script_pubkeys, amounts) = generate_prevouts(num_inputs);
            let ctx = SighashContext::new(&tx, &script_pubkeys, &amounts).expect("lists are complete");
            let txouts = prevouts(&script_pubkeys, &amounts);
            let sighash_type = ALL_SIGHASH_TYPES[type_index];
            let annex = with_annex.then(|| Annex::new(vec![TAPROOT_ANNEX_PREFIX, 0xaa]).expect("valid annex"));

            let mut cache = SighashCache::new(&tx);
            for input_index in 0..num_inputs.min(num_outputs) {
                let expected = cache
                    .taproot_signature_hash(
                        input_index,
                        &Prevouts::All(&txouts),
                        annex.as_ref().map(|annex| sighash::Annex::new(annex.as_bytes()).expect("valid annex")),
                        None,
                        sighash_type,
                    )
                    .expect("bitcoin computes the sighash");

                let actual = ctx
                    .key_spend(input_index, sighash_type, annex.as_ref())
                    .expect("sighash must be computed");

                prop_assert_eq!(actual, Message::from_digest(expected.to_byte_array()));
            }
        }

        #[test]
        fn script_spend_matches_bitcoin(
            num_inputs in 1usize..4,
            type_index in 0usize..ALL_SIGHASH_TYPES.len(),
            code_separator_pos in prop_oneof![Just(NO_CODE_SEPARATOR), 0u32..10],
            script_bytes in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let tx = generate_tx(num_inputs, num_inputs);
            let (script_pubkeys, amounts) = generate_prevouts(num_inputs);
            let ctx = SighashContext::new(&tx, &script_pubkeys, &amounts).expect("lists are complete");
            let txouts = prevouts(&script_pubkeys, &amounts);
            let sighash_type = ALL_SIGHASH_TYPES[type_index];

            let leaf = taptree_primitives::leaf::ScriptLeaf::new(ScriptBuf::from_bytes(script_bytes));
            let commitment = ScriptPathCommitment {
                leaf_hash: leaf.leaf_hash(),
                code_separator_pos,
            };
            let bitcoin_leaf_hash = TapLeafHash::from_byte_array(leaf.leaf_hash().to_byte_array());

            let mut cache = SighashCache::new(&tx);
            for input_index in 0..num_inputs {
                let expected = cache
                    .taproot_signature_hash(
                        input_index,
                        &Prevouts::All(&txouts),
                        None,
                        Some((bitcoin_leaf_hash, code_separator_pos)),
                        sighash_type,
                    )
                    .expect("bitcoin computes the sighash");

                let actual = ctx
                    .script_spend(input_index, sighash_type, None, commitment)
                    .expect("sighash must be computed");

                prop_assert_eq!(actual, Message::from_digest(expected.to_byte_array()));
            }
        }
    }
}
