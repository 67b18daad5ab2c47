//! # Ferrum Protocol
//!
//! The accounting core of a collateral-backed stablecoin: troves
//! (collateralized debt positions) mint fUSD against collateral, pay
//! user-chosen interest rates, and are kept solvent by liquidation,
//! redistribution and redemption.
//!
//! ## Architecture
//!
//! - **Core**: Amount types, token ledger, pools, trove registry,
//!   interest accrual and fee curves
//! - **Liquidation**: Liquidation engine and stability pool
//! - **Protocol**: The facade tying everything together, plus redemption
//!
//! Everything is deterministic integer arithmetic over an in-memory
//! ledger; time and price are inputs, never observed.
//!
//! ## Example
//!
//! ```rust
//! use ferrum::prelude::*;
//!
//! let mut protocol = Protocol::new(ProtocolParams::default())?;
//! protocol.update_price(200_000)?; // $2000 per collateral unit
//!
//! let trove = protocol.open_trove(
//!     AccountId(42),
//!     CollateralAmount::from_units(3),
//!     TokenAmount::from_dollars(4000),
//!     300, // 3% annual interest
//! )?;
//! assert_eq!(protocol.trove_reading(trove)?.icr, 150);
//! # Ok::<(), ferrum::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod error;
pub mod liquidation;
pub mod protocol;
pub mod utils;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        config::ProtocolParams,
        fees::FeeState,
        pools::{ActivePool, CollSurplusPool, DefaultPool},
        token::{AccountId, CollateralAmount, Fusd, TokenAmount},
        trove::{Batch, BatchId, Trove, TroveId, TroveRegistry, TroveStatus},
    };
    pub use crate::error::{Error, Result};
    pub use crate::liquidation::{
        engine::{LiquidationMode, LiquidationSummary},
        stability_pool::StabilityPool,
    };
    pub use crate::protocol::{
        engine::{LedgerSnapshot, Protocol, StabilityReading, TroveReading},
        redemption::RedemptionSummary,
    };
}

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name
pub const PROTOCOL_NAME: &str = "fUSD";
