use anyhow::{bail, Context, Result};
use bitcoin::{
    consensus::encode::{deserialize_hex, serialize_hex},
    hex::DisplayHex,
    Amount, ScriptBuf, Transaction, Witness,
};
use secp256k1::SecretKey;
use taptree_primitives::{scripts::p2pk_key, secp::parse_secret_key};
use taptree_spend::{
    check::check_spend,
    output::TaprootOutput,
    signer::{KeyPathSigner, ScriptPathSigner},
    witness::TaprootWitness,
};
use tracing::{info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    cli::{SignKeyPathArgs, SignScriptPathArgs, SpendArgs},
    params::{OutputDescriptor, Prevouts},
};

/// Everything needed to sign one input, loaded from the command line arguments.
struct SpendContext {
    descriptor: OutputDescriptor,
    output: TaprootOutput,
    tx: Transaction,
    input_index: usize,
    script_pubkeys: Vec<ScriptBuf>,
    amounts: Vec<Amount>,
    secret_key: SecretKey,
}

impl SpendContext {
    fn load(args: SpendArgs) -> Result<Self> {
        let SpendArgs {
            descriptor,
            prevouts,
            tx,
            input_index,
            mut secret_key,
        } = args;

        let decoded = hex::decode(&secret_key);
        secret_key.zeroize();
        let bytes = Zeroizing::new(decoded.context("secret key is not hex")?);
        let secret_key = parse_secret_key(&bytes).context("invalid secret key")?;

        let descriptor = OutputDescriptor::from_path(descriptor)?;
        let output = descriptor.build_output()?;
        let tx: Transaction = deserialize_hex(&tx).context("invalid transaction hex")?;
        let (script_pubkeys, amounts) = Prevouts::from_path(prevouts)?.into_lists();

        let Some(funded) = script_pubkeys.get(input_index) else {
            bail!(
                "input index {input_index} out of range for {} prevouts",
                script_pubkeys.len()
            );
        };
        output.verify_script_pubkey(funded)?;

        Ok(Self {
            descriptor,
            output,
            tx,
            input_index,
            script_pubkeys,
            amounts,
            secret_key,
        })
    }

    /// Puts `witness` on the input, self-checks the spend and prints the result.
    fn finish(mut self, witness: Witness) -> Result<()> {
        self.secret_key.non_secure_erase();
        self.tx.input[self.input_index].witness = witness;

        let outcome = check_spend(
            &self.tx,
            self.input_index,
            &self.script_pubkeys,
            &self.amounts,
        )
        .context("signed spend failed the self-check")?;
        info!(action = "spend checked", input_index = self.input_index, ?outcome);

        for (index, element) in self.tx.input[self.input_index].witness.iter().enumerate() {
            println!("witness[{index}]: {}", element.to_lower_hex_string());
        }
        println!("tx: {}", serialize_hex(&self.tx));

        Ok(())
    }
}

pub(crate) fn handle_sign_key_path(args: SignKeyPathArgs) -> Result<()> {
    let ctx = SpendContext::load(args.spend_args)?;

    info!(action = "signing on the key path", input_index = ctx.input_index);

    let signature = KeyPathSigner::new(ctx.descriptor.signing).sign(
        &ctx.tx,
        ctx.input_index,
        &ctx.script_pubkeys,
        &ctx.amounts,
        &ctx.secret_key,
        ctx.output.tree(),
    )?;
    let witness = ctx
        .output
        .finalize_witness(TaprootWitness::Key { signature })?;

    ctx.finish(witness)
}

pub(crate) fn handle_sign_script_path(args: SignScriptPathArgs) -> Result<()> {
    let SignScriptPathArgs {
        leaf_index,
        spend_args,
    } = args;
    let ctx = SpendContext::load(spend_args)?;

    let Some(tree) = ctx.output.tree() else {
        bail!("output has no script tree");
    };
    let leaf = tree.leaf(leaf_index)?;

    let Some(leaf_key) = p2pk_key(leaf.script()) else {
        bail!("leaf {leaf_index} is not a single-key leaf");
    };
    if leaf_key != ctx.secret_key.x_only_public_key(secp256k1::SECP256K1).0 {
        warn!(%leaf_key, "secret key does not match the leaf key, the self-check will fail");
    }

    info!(action = "signing on the script path", input_index = ctx.input_index, %leaf_index);

    let signature = ScriptPathSigner::new(ctx.descriptor.signing).sign(
        &ctx.tx,
        ctx.input_index,
        &ctx.script_pubkeys,
        &ctx.amounts,
        &ctx.secret_key,
        leaf,
    )?;
    let witness = ctx.output.finalize_witness(TaprootWitness::Script {
        leaf_index,
        script_inputs: vec![signature.to_vec()],
    })?;

    ctx.finish(witness)
}
