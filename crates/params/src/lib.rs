//! This crate contains the parameters that are threaded explicitly through output construction
//! and signing, instead of living in process-wide state.

pub mod default;
pub mod errors;
pub mod network;
pub mod prelude;
pub mod signing;
