//! Module to generate random bitcoin values for testing.

use bitcoin::{
    absolute::LockTime,
    hashes::Hash,
    key::{
        rand::{rngs::OsRng, thread_rng, Rng},
        TweakedPublicKey,
    },
    transaction::Version,
    Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use secp256k1::{schnorr::Signature, Keypair, SecretKey, XOnlyPublicKey, SECP256K1};
use taptree_primitives::{secp::EvenSecretKey, tree::ScriptTree};

/// Generates a random transaction ID.
pub fn generate_txid() -> Txid {
    let mut txid = [0u8; 32];
    OsRng.fill(&mut txid);

    Txid::from_byte_array(txid)
}

/// Generates a random outpoint.
pub fn generate_outpoint() -> OutPoint {
    let vout: u32 = OsRng.gen();

    OutPoint {
        txid: generate_txid(),
        vout,
    }
}

/// Generates a random signature.
pub fn generate_signature() -> Signature {
    let mut sig = [0u8; 64];
    OsRng.fill(&mut sig);

    Signature::from_slice(&sig).expect("should be able to generate arbitrary signature")
}

/// Generates a random secret key.
pub fn generate_secret_key() -> SecretKey {
    SecretKey::new(&mut OsRng)
}

/// Generates a random keypair that is guaranteed to be of even parity.
pub fn generate_keypair() -> Keypair {
    let sk: EvenSecretKey = generate_secret_key().into();

    Keypair::from_secret_key(SECP256K1, &sk)
}

/// Generates a random x-only public key.
pub fn generate_xonly_pubkey() -> XOnlyPublicKey {
    let mut rng = thread_rng();
    let sk = SecretKey::new(&mut rng);

    sk.x_only_public_key(SECP256K1).0
}

/// Generates a random pay-to-taproot scriptPubKey.
pub fn generate_p2tr_script_pubkey() -> ScriptBuf {
    ScriptBuf::new_p2tr_tweaked(TweakedPublicKey::dangerous_assume_tweaked(
        generate_xonly_pubkey(),
    ))
}

/// Generates a random amount that fits comfortably in the supply.
pub fn generate_amount() -> Amount {
    let value: u32 = OsRng.gen();

    Amount::from_sat(value as u64)
}

/// Generates a random unsigned version 2 transaction.
///
/// Inputs have random outpoints and sequences and empty witnesses. Outputs pay random amounts to
/// random taproot outputs.
pub fn generate_tx(num_inputs: usize, num_outputs: usize) -> Transaction {
    let inputs = (0..num_inputs)
        .map(|_| TxIn {
            previous_output: generate_outpoint(),
            witness: Witness::new(),
            sequence: Sequence(OsRng.gen()),
            script_sig: ScriptBuf::new(),
        })
        .collect();

    let outputs = (0..num_outputs)
        .map(|_| TxOut {
            value: generate_amount(),
            script_pubkey: generate_p2tr_script_pubkey(),
        })
        .collect();

    Transaction {
        version: Version::TWO,
        lock_time: LockTime::from_consensus(OsRng.gen_range(0..500_000_000)),
        input: inputs,
        output: outputs,
    }
}

/// Generates the scriptPubKeys and amounts of `count` random taproot prevouts.
pub fn generate_prevouts(count: usize) -> (Vec<ScriptBuf>, Vec<Amount>) {
    (0..count)
        .map(|_| (generate_p2tr_script_pubkey(), generate_amount()))
        .unzip()
}

/// Returns the depth of every leaf of `tree`, in leaf order.
///
/// Feeding these to [`bitcoin::taproot::TaprootBuilder::add_leaf`] in the same order rebuilds
/// the same tree.
pub fn leaf_depths(tree: &ScriptTree) -> Vec<usize> {
    (0..tree.num_leaves())
        .map(|index| {
            tree.merkle_path(index)
                .expect("index is within the tree")
                .len()
        })
        .collect()
}
