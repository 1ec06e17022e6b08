//! Signing parameters.

use bitcoin::TapSighashType;
use serde::{Deserialize, Serialize};

use crate::{default, errors::ParamsError};

/// Parameters that control how inputs are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigningParams {
    /// The sighash type that every produced signature commits to.
    #[serde(default = "default_sighash_type")]
    pub sighash_type: TapSighashType,
}

const fn default_sighash_type() -> TapSighashType {
    default::SIGHASH_TYPE
}

impl SigningParams {
    /// Creates parameters with the given sighash type.
    pub const fn new(sighash_type: TapSighashType) -> Self {
        Self { sighash_type }
    }

    /// Creates parameters from the consensus encoding of a sighash type.
    pub fn from_sighash_byte(byte: u8) -> Result<Self, ParamsError> {
        TapSighashType::from_consensus_u8(byte)
            .map(Self::new)
            .map_err(|_| ParamsError::InvalidSighashType(byte))
    }

    /// Returns the configured sighash type.
    pub const fn sighash_type(&self) -> TapSighashType {
        self.sighash_type
    }
}

impl Default for SigningParams {
    fn default() -> Self {
        Self::new(default::SIGHASH_TYPE)
    }
}
