//! Commonly used items of this crate.

pub use crate::{bitcoin::*, fixtures::*, strategies::*};
