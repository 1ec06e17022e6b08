//! Errors for the engine parameters.

use thiserror::Error;

/// Error while creating or validating parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// The byte is not one of the BIP341 sighash types.
    #[error("invalid taproot sighash type: {0:#04x}")]
    InvalidSighashType(u8),
}
