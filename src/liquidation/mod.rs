//! Liquidation engine and stability pool.

pub mod engine;
pub mod stability_pool;
