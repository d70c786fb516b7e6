//! Utilities shared across the crate.

pub mod binary;

pub use binary::{BinaryError, BinaryResult};
