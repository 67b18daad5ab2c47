//! Decaying fee state shared by borrowing and redemption.
//!
//! A single base rate (in basis points) is bumped by redemption volume and
//! decays exponentially with a configurable half-life. The borrowing and
//! redemption rates are the decayed base rate plus their respective floors,
//! capped. Everything is a pure function of the state and the caller's
//! clock; nothing here keeps its own timer.

use serde::{Deserialize, Serialize};

use crate::core::config::ProtocolParams;
use crate::core::token::TokenAmount;
use crate::utils::constants::BPS_DIVISOR;
use crate::utils::math::safe_mul_div;

/// Fee base-rate state plus cumulative fee counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeState {
    /// Base rate in basis points, as of `last_update`
    base_rate_bps: u64,
    /// Timestamp the base rate was last written
    last_update: u64,
    /// Total borrowing fees charged, in cents
    total_borrowing_fees: TokenAmount,
    /// Total redemption fees charged, in collateral value cents
    total_redemption_fees: TokenAmount,
}

impl FeeState {
    /// Create fresh fee state
    pub fn new() -> Self {
        Self::default()
    }

    /// Base rate decayed to `now`: rate * 0.5^(elapsed / half_life)
    pub fn decayed_base_rate(&self, now: u64, params: &ProtocolParams) -> u64 {
        if self.base_rate_bps == 0 {
            return 0;
        }
        let elapsed = now.saturating_sub(self.last_update);
        let half_lives = elapsed as f64 / params.fee_half_life_secs as f64;
        let decay_factor = 0.5_f64.powf(half_lives);
        ((self.base_rate_bps as f64) * decay_factor) as u64
    }

    /// Current borrowing fee rate in basis points
    pub fn borrowing_rate(&self, now: u64, params: &ProtocolParams) -> u64 {
        (self.decayed_base_rate(now, params) + params.borrow_fee_floor_bps)
            .min(params.borrow_fee_cap_bps)
    }

    /// Current redemption fee rate in basis points
    pub fn redemption_rate(&self, now: u64, params: &ProtocolParams) -> u64 {
        (self.decayed_base_rate(now, params) + params.redemption_fee_floor_bps)
            .min(params.redemption_fee_cap_bps)
    }

    /// Record a borrowing fee charge
    pub fn record_borrowing(&mut self, fee: TokenAmount) {
        self.total_borrowing_fees = self.total_borrowing_fees.saturating_add(fee);
    }

    /// Record a redemption: decay the base rate to `now`, then bump it by
    /// half the redeemed fraction of supply
    pub fn record_redemption(
        &mut self,
        now: u64,
        redeemed: TokenAmount,
        supply_before: TokenAmount,
        fee_value: TokenAmount,
        params: &ProtocolParams,
    ) {
        let decayed = self.decayed_base_rate(now, params);
        let bump = if supply_before.is_zero() {
            0
        } else {
            safe_mul_div(redeemed.cents(), BPS_DIVISOR, supply_before.cents()).unwrap_or(0) / 2
        };
        self.base_rate_bps = decayed.saturating_add(bump);
        self.last_update = now;
        self.total_redemption_fees = self.total_redemption_fees.saturating_add(fee_value);
    }

    /// Total borrowing fees charged so far
    pub fn total_borrowing_fees(&self) -> TokenAmount {
        self.total_borrowing_fees
    }

    /// Total redemption fee value charged so far
    pub fn total_redemption_fees(&self) -> TokenAmount {
        self.total_redemption_fees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_applies_with_zero_base_rate() {
        let fees = FeeState::new();
        let params = ProtocolParams::default();

        assert_eq!(fees.borrowing_rate(0, &params), params.borrow_fee_floor_bps);
        assert_eq!(fees.redemption_rate(0, &params), params.redemption_fee_floor_bps);
    }

    #[test]
    fn test_redemption_bumps_base_rate() {
        let mut fees = FeeState::new();
        let params = ProtocolParams::default();

        // Redeem 10% of supply: bump = 1000 bps / 2 = 500
        fees.record_redemption(
            100,
            TokenAmount::from_dollars(10_000),
            TokenAmount::from_dollars(100_000),
            TokenAmount::ZERO,
            &params,
        );

        assert_eq!(fees.decayed_base_rate(100, &params), 500);
        // Capped at the redemption fee ceiling
        assert_eq!(fees.redemption_rate(100, &params), params.redemption_fee_cap_bps);
    }

    #[test]
    fn test_base_rate_decays() {
        let mut fees = FeeState::new();
        let params = ProtocolParams::default();

        fees.record_redemption(
            0,
            TokenAmount::from_dollars(10_000),
            TokenAmount::from_dollars(100_000),
            TokenAmount::ZERO,
            &params,
        );
        let at_zero = fees.decayed_base_rate(0, &params);

        let after_half_life = fees.decayed_base_rate(params.fee_half_life_secs, &params);
        assert_eq!(after_half_life, at_zero / 2);

        // Far future decays to nothing
        let later = fees.decayed_base_rate(params.fee_half_life_secs * 40, &params);
        assert_eq!(later, 0);
    }

    #[test]
    fn test_fee_counters() {
        let mut fees = FeeState::new();
        let params = ProtocolParams::default();

        fees.record_borrowing(TokenAmount::from_dollars(5));
        fees.record_redemption(
            0,
            TokenAmount::from_dollars(1000),
            TokenAmount::from_dollars(10_000),
            TokenAmount::from_dollars(5),
            &params,
        );

        assert_eq!(fees.total_borrowing_fees(), TokenAmount::from_dollars(5));
        assert_eq!(fees.total_redemption_fees(), TokenAmount::from_dollars(5));
    }
}
