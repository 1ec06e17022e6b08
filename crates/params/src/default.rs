//! Default parameter values.

use bitcoin::{Network, TapSighashType};

/// Default network when none is configured.
pub(crate) const NETWORK: Network = Network::Regtest;

/// Default sighash type.
///
/// `SIGHASH_DEFAULT` commits to the whole transaction and yields 64-byte signatures.
pub(crate) const SIGHASH_TYPE: TapSighashType = TapSighashType::Default;
