//! SECP256K1 primitives.

use std::ops::Deref;

use secp256k1::{Parity, PublicKey, SecretKey, XOnlyPublicKey, SECP256K1};

use crate::errors::KeyError;

/// A secret key that is guaranteed to have an even x-only public key.
///
/// The wrapped secret is erased when the value is dropped.
#[derive(Debug)]
pub struct EvenSecretKey(SecretKey);

impl Deref for EvenSecretKey {
    type Target = SecretKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<SecretKey> for EvenSecretKey {
    fn as_ref(&self) -> &SecretKey {
        &self.0
    }
}

impl From<SecretKey> for EvenSecretKey {
    fn from(value: SecretKey) -> Self {
        match value.x_only_public_key(SECP256K1).1 == Parity::Odd {
            true => Self(value.negate()),
            false => Self(value),
        }
    }
}

impl Drop for EvenSecretKey {
    fn drop(&mut self) {
        self.0.non_secure_erase();
    }
}

/// Parses an internal key given either as a 32-byte x-only key or a 33-byte compressed key.
///
/// Compressed keys are normalized to their x-only form; the parity byte is discarded.
pub fn parse_xonly_key(bytes: &[u8]) -> Result<XOnlyPublicKey, KeyError> {
    match bytes.len() {
        32 => Ok(XOnlyPublicKey::from_slice(bytes)?),
        33 => Ok(PublicKey::from_slice(bytes)?.x_only_public_key().0),
        len => Err(KeyError::InvalidPublicKeyLength(len)),
    }
}

/// Parses a 32-byte secret key.
pub fn parse_secret_key(bytes: &[u8]) -> Result<SecretKey, KeyError> {
    Ok(SecretKey::from_slice(bytes)?)
}
