//! This crate spends taproot outputs built from `taptree-primitives`.
//!
//! It computes signature messages for both spending paths, signs them, builds and checks control
//! blocks, assembles witnesses and finally checks a signed spend before it is broadcast. Every
//! operation takes its network and signing parameters explicitly.

pub mod check;
pub mod control_block;
pub mod errors;
pub mod output;
pub mod prelude;
pub mod sighash;
pub mod signer;
pub mod witness;
