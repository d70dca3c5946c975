//! Small helpers shared by the `dexfacts` crates.

pub mod strings;
pub mod writers;
