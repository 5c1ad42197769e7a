#![doc = include_str!("../README.md")]

pub use derivatives_engine::*;

/// Declare a grammar with rule notation.
///
/// See [`derivatives_macros::grammar`] for the notation.
pub use derivatives_macros::grammar;
