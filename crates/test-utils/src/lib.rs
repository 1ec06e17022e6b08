//! This crate provides test-utilities for the taproot crates in this workspace.
//!
//! These utilities are mostly used to generate arbitrary keys, transactions and script trees, and
//! to build fixtures that are tedious to find by hand.

pub mod bitcoin;
pub mod fixtures;
pub mod prelude;
pub mod strategies;
