//! Core ledger types: amounts, pools, troves, interest and fees.

pub mod config;
pub mod fees;
pub mod interest;
pub mod pools;
pub mod token;
pub mod trove;
