//! This crate contains the pure building blocks of a taproot output: tagged hashes, script leaves,
//! script trees, key tweaking and common leaf templates.
//!
//! Nothing in here touches transactions or signatures, those live in `taptree-spend`. This crate
//! lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace.

pub mod constants;
pub mod errors;
pub mod hashes;
pub mod leaf;
pub mod prelude;
pub mod scripts;
pub mod secp;
pub mod tree;
pub mod tweak;
