//! Protocol facade: atomic state transitions over the whole ledger.

pub mod engine;
pub mod redemption;
