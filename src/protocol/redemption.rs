//! Redemption of fUSD for collateral at face value.
//!
//! A redeemer burns fUSD and receives collateral worth the same amount at
//! the current price, minus the redemption fee. Troves are redeemed
//! against in ascending interest-rate order, so cheap debt goes first.
//! The fee is taken in collateral and stays with the redeemed trove; a
//! fully redeemed trove closes and its leftover collateral becomes a
//! surplus claim for the owner. A partial redemption never leaves a trove
//! below the minimum debt: the lot is clamped so the remainder is either
//! zero or at least the floor.

use tracing::{debug, info};

use crate::core::token::{AccountId, CollateralAmount, TokenAmount};
use crate::core::trove::{TroveId, TroveStatus};
use crate::error::{Error, Result};
use crate::protocol::engine::Protocol;
use crate::utils::constants::RATIO_PRECISION;
use crate::utils::math::{collateral_for_value, collateral_ratio, collateral_value, fee_on};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// One trove's part of a redemption
#[derive(Debug, Clone, Copy)]
pub struct RedeemedTrove {
    /// The trove
    pub id: TroveId,
    /// Debt cancelled against it
    pub debt_redeemed: TokenAmount,
    /// Collateral that left the trove for the redeemer
    pub collateral_paid: CollateralAmount,
    /// Whether the trove was fully redeemed and closed
    pub closed: bool,
}

/// Result of one redemption call
#[derive(Debug, Clone, Default)]
pub struct RedemptionSummary {
    /// Amount the caller asked to redeem
    pub requested: TokenAmount,
    /// Amount actually redeemed and burned
    pub redeemed: TokenAmount,
    /// Collateral paid to the redeemer
    pub collateral_paid: CollateralAmount,
    /// Collateral fee left behind in the redeemed troves
    pub collateral_fee: CollateralAmount,
    /// Fee rate applied, in basis points
    pub rate_bps: u64,
    /// Troves touched, cheapest rate first
    pub redeemed_troves: Vec<RedeemedTrove>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

impl Protocol {
    /// Redeem `amount` of the caller's fUSD for collateral at face value.
    ///
    /// Walks active troves from the lowest interest rate up, skipping any
    /// below 100% collateralization. Burns only what was actually
    /// redeemed; errors with [`Error::NoEligibleCandidates`] when no debt
    /// could be touched at all.
    pub fn redeem(&mut self, redeemer: AccountId, amount: TokenAmount) -> Result<RedemptionSummary> {
        let price = if self.price == 0 {
            return Err(Error::InvalidState("price has not been set".into()));
        } else {
            self.price
        };
        if amount.is_zero() {
            return Err(Error::InvalidAmount {
                reason: "redemption amount cannot be zero".into(),
            });
        }
        let balance = self.ledger.balance_of(redeemer);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.cents(),
                available: balance.cents(),
            });
        }

        let rate_bps = self.fees.redemption_rate(self.now, &self.params);
        let supply_before = self.ledger.total_supply();

        // Cheapest debt first, id as the tiebreaker
        let mut candidates: Vec<(u64, TroveId)> = self
            .registry
            .active_trove_ids()
            .into_iter()
            .map(|id| (self.registry.trove(id).map(|t| t.rate_bps).unwrap_or(u64::MAX), id))
            .collect();
        candidates.sort();

        let mut summary = RedemptionSummary {
            requested: amount,
            rate_bps,
            ..RedemptionSummary::default()
        };
        let mut remaining = amount;

        for (_, id) in candidates {
            if remaining.is_zero() {
                break;
            }
            if let Some(record) = self.redeem_against(id, remaining, rate_bps, price)? {
                remaining = remaining.saturating_sub(record.debt_redeemed);
                summary.redeemed = summary.redeemed.saturating_add(record.debt_redeemed);
                summary.collateral_paid =
                    summary.collateral_paid.saturating_add(record.collateral_paid);
                summary.redeemed_troves.push(record);
            }
        }

        if summary.redeemed.is_zero() {
            return Err(Error::NoEligibleCandidates);
        }

        // The fee is the value gap between debt cancelled and collateral paid
        let paid_value = collateral_value(summary.collateral_paid.base_units(), price)?;
        let fee_value = summary.redeemed.saturating_sub(TokenAmount::from_cents(paid_value));
        summary.collateral_fee = CollateralAmount::from_base_units(collateral_for_value(
            fee_value.cents(),
            price,
        )?);

        self.ledger.burn(redeemer, summary.redeemed)?;
        self.coll_out = self.coll_out.saturating_add(summary.collateral_paid);
        self.fees
            .record_redemption(self.now, summary.redeemed, supply_before, fee_value, &self.params);

        info!(
            %redeemer,
            redeemed = summary.redeemed.cents(),
            collateral = summary.collateral_paid.base_units(),
            rate_bps,
            troves = summary.redeemed_troves.len(),
            "redemption complete"
        );
        Ok(summary)
    }

    fn redeem_against(
        &mut self,
        id: TroveId,
        remaining: TokenAmount,
        rate_bps: u64,
        price: u64,
    ) -> Result<Option<RedeemedTrove>> {
        // Work out the lot on the projected settled position so a trove
        // that ends up skipped is left completely untouched
        let report = self.registry.preview(id, self.now)?;
        let trove = self.registry.trove(id)?;
        let owner = trove.owner;
        let coll = trove.collateral.saturating_add(report.redist_coll);
        let debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);

        // Redeeming against an undercollateralized trove would drain its
        // collateral before its debt; leave those to the liquidator
        if collateral_ratio(coll.base_units(), price, debt.cents()) < RATIO_PRECISION {
            return Ok(None);
        }

        // Clamp so a partial redemption never strands debt below the floor
        let mut lot = remaining.min(debt);
        if lot < debt {
            let left = debt.saturating_sub(lot);
            if left < self.params.min_debt {
                lot = debt.saturating_sub(self.params.min_debt);
            }
        }
        if lot.is_zero() {
            return Ok(None);
        }
        let closing = lot == debt;

        self.settle_position(id)?;

        let drawn = collateral_for_value(lot.cents(), price)?;
        let fee = fee_on(drawn, rate_bps)?;
        let paid = CollateralAmount::from_base_units(drawn - fee);

        self.active.remove_debt(lot)?;
        self.active.remove_collateral(paid)?;

        let trove = self.registry.trove_mut(id)?;
        trove.debt = trove.debt.saturating_sub(lot);
        trove.collateral = trove
            .collateral
            .checked_sub(paid)
            .ok_or_else(|| Error::InvariantViolation("redemption exceeds trove collateral".into()))?;

        if closing {
            let leftover = trove.collateral;
            self.active.remove_collateral(leftover)?;
            self.surplus.credit(owner, leftover);
            self.registry.close_trove(id, TroveStatus::Closed)?;
            debug!(%id, leftover = leftover.base_units(), "trove fully redeemed");
        } else {
            self.registry.update_stake(id)?;
        }

        Ok(Some(RedeemedTrove {
            id,
            debt_redeemed: lot,
            collateral_paid: paid,
            closed: closing,
        }))
    }
}
