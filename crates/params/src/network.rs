//! Network parameters.

use bitcoin::{KnownHrp, Network};
use serde::{Deserialize, Serialize};

use crate::default;

/// Network parameters used when encoding outputs as addresses.
///
/// This value is handed to every output constructor; nothing in the engine reads the network from
/// global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkParams {
    /// The bitcoin network the outputs live on.
    pub network: Network,
}

impl NetworkParams {
    /// Creates parameters for the given network.
    pub const fn new(network: Network) -> Self {
        Self { network }
    }

    /// Parameters for mainnet.
    pub const fn mainnet() -> Self {
        Self::new(Network::Bitcoin)
    }

    /// Parameters for testnet3.
    pub const fn testnet() -> Self {
        Self::new(Network::Testnet)
    }

    /// Parameters for signet.
    pub const fn signet() -> Self {
        Self::new(Network::Signet)
    }

    /// Parameters for regtest.
    pub const fn regtest() -> Self {
        Self::new(Network::Regtest)
    }

    /// Returns the network.
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Returns the human-readable part used by bech32m addresses on this network.
    pub fn hrp(&self) -> KnownHrp {
        KnownHrp::from(self.network)
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::new(default::NETWORK)
    }
}

impl From<Network> for NetworkParams {
    fn from(network: Network) -> Self {
        Self::new(network)
    }
}
