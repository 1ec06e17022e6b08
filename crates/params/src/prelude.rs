//! Re-exports of the commonly used parameter types.

pub use crate::{errors::*, network::NetworkParams, signing::SigningParams};
