//! Protocol parameters.
//!
//! All tunable thresholds live here so operations never reach for magic
//! numbers. Defaults come from [`crate::utils::constants`]; tests that
//! assert exact amounts can zero the fee floors.

use serde::{Deserialize, Serialize};

use crate::core::token::TokenAmount;
use crate::error::{Error, Result};
use crate::utils::constants::*;

/// Tunable protocol parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Minimum collateralization ratio per trove, as a percentage
    pub mcr: u64,
    /// Critical system ratio debt increases must preserve, as a percentage
    pub ccr: u64,
    /// Extra percentage points of ratio required to join a batch
    pub batch_join_buffer: u64,
    /// Liquidation penalty when offset against the stability pool, in bps
    pub sp_offset_penalty_bps: u64,
    /// Liquidation penalty when redistributed to other troves, in bps
    pub redistribution_penalty_bps: u64,
    /// Minimum debt an open trove may carry
    pub min_debt: TokenAmount,
    /// Lowest allowed annual interest rate, in bps
    pub min_rate_bps: u64,
    /// Highest allowed annual interest rate, in bps
    pub max_rate_bps: u64,
    /// Highest allowed batch management fee, in bps
    pub max_management_fee_bps: u64,
    /// Borrowing fee floor, in bps
    pub borrow_fee_floor_bps: u64,
    /// Borrowing fee cap, in bps
    pub borrow_fee_cap_bps: u64,
    /// Redemption fee floor, in bps
    pub redemption_fee_floor_bps: u64,
    /// Redemption fee cap, in bps
    pub redemption_fee_cap_bps: u64,
    /// Fee base rate decay half-life, in seconds
    pub fee_half_life_secs: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            mcr: MIN_COLLATERAL_RATIO,
            ccr: CRITICAL_COLLATERAL_RATIO,
            batch_join_buffer: BATCH_JOIN_BUFFER,
            sp_offset_penalty_bps: SP_OFFSET_PENALTY_BPS,
            redistribution_penalty_bps: REDISTRIBUTION_PENALTY_BPS,
            min_debt: TokenAmount::from_cents(MIN_DEBT),
            min_rate_bps: MIN_ANNUAL_RATE_BPS,
            max_rate_bps: MAX_ANNUAL_RATE_BPS,
            max_management_fee_bps: MAX_MANAGEMENT_FEE_BPS,
            borrow_fee_floor_bps: BORROWING_FEE_FLOOR_BPS,
            borrow_fee_cap_bps: BORROWING_FEE_CAP_BPS,
            redemption_fee_floor_bps: REDEMPTION_FEE_FLOOR_BPS,
            redemption_fee_cap_bps: REDEMPTION_FEE_CAP_BPS,
            fee_half_life_secs: FEE_DECAY_HALF_LIFE_SECS,
        }
    }
}

impl ProtocolParams {
    /// Validate internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.mcr < RATIO_PRECISION {
            return Err(Error::InvalidAmount {
                reason: "mcr below 100%".into(),
            });
        }
        if self.ccr < self.mcr {
            return Err(Error::InvalidAmount {
                reason: "ccr below mcr".into(),
            });
        }
        if self.min_rate_bps > self.max_rate_bps {
            return Err(Error::InvalidAmount {
                reason: "min rate exceeds max rate".into(),
            });
        }
        if self.borrow_fee_floor_bps > self.borrow_fee_cap_bps {
            return Err(Error::InvalidAmount {
                reason: "borrow fee floor exceeds cap".into(),
            });
        }
        if self.redemption_fee_floor_bps > self.redemption_fee_cap_bps {
            return Err(Error::InvalidAmount {
                reason: "redemption fee floor exceeds cap".into(),
            });
        }
        if self.fee_half_life_secs == 0 {
            return Err(Error::InvalidAmount {
                reason: "fee half-life cannot be zero".into(),
            });
        }
        Ok(())
    }

    /// Ratio required to join a batch
    pub fn batch_join_ratio(&self) -> u64 {
        self.mcr + self.batch_join_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(ProtocolParams::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut params = ProtocolParams::default();
        params.ccr = params.mcr - 1;
        assert!(params.validate().is_err());

        let mut params = ProtocolParams::default();
        params.min_rate_bps = params.max_rate_bps + 1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_batch_join_ratio() {
        let params = ProtocolParams::default();
        assert_eq!(params.batch_join_ratio(), 120);
    }
}
