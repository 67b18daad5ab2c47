//! Shared utilities: constants and safe arithmetic.

pub mod constants;
pub mod math;
