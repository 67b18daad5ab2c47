//! Liquidation of undercollateralized troves.
//!
//! Candidates are checked against the minimum collateralization ratio on
//! their projected settled position and processed worst-first; only
//! troves that will actually be liquidated are settled. Each liquidated trove goes down one of
//! two paths: if the stability pool can absorb the entire debt it is offset
//! there and burned, with a 5% collateral penalty for the depositors;
//! otherwise the debt and collateral are redistributed across the remaining
//! troves with a 10% penalty. Collateral beyond the penalty is left as a
//! surplus claim for the former owner. A trove that fits neither path
//! (empty pool and no other stakes) is skipped.

use tracing::{info, warn};

use crate::core::token::{AccountId, CollateralAmount, TokenAmount};
use crate::core::trove::{TroveId, TroveStatus};
use crate::error::{Error, Result};
use crate::protocol::engine::Protocol;
use crate::utils::math::{collateral_ratio, seize_amounts};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// How a trove's debt was absorbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationMode {
    /// Debt burned against stability pool deposits
    Offset,
    /// Debt and collateral spread across remaining troves
    Redistribution,
}

/// One liquidated trove
#[derive(Debug, Clone, Copy)]
pub struct LiquidatedTrove {
    /// The trove
    pub id: TroveId,
    /// Its former owner
    pub owner: AccountId,
    /// Debt absorbed, after settlement
    pub debt: TokenAmount,
    /// Collateral seized as the penalty-bearing portion
    pub collateral_seized: CollateralAmount,
    /// Collateral left claimable by the former owner
    pub surplus: CollateralAmount,
    /// Which path absorbed the debt
    pub mode: LiquidationMode,
}

/// Result of one liquidation call
#[derive(Debug, Clone, Default)]
pub struct LiquidationSummary {
    /// Troves liquidated, worst collateralization first
    pub liquidated: Vec<LiquidatedTrove>,
    /// Total debt offset against the stability pool
    pub debt_offset: TokenAmount,
    /// Total debt redistributed
    pub debt_redistributed: TokenAmount,
    /// Total collateral seized across both paths
    pub collateral_seized: CollateralAmount,
    /// Total collateral credited back to former owners
    pub surplus: CollateralAmount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

impl Protocol {
    /// Liquidate every undercollateralized trove among `candidates`.
    ///
    /// Unknown ids are an error; healthy candidates are skipped. Errors
    /// with [`Error::NoEligibleCandidates`] when nothing was liquidated.
    pub fn liquidate(&mut self, candidates: &[TroveId]) -> Result<LiquidationSummary> {
        let price = if self.price == 0 {
            return Err(Error::InvalidState("price has not been set".into()));
        } else {
            self.price
        };

        // Validate up front, then order worst-first by projected ICR
        let mut ordered: Vec<(u64, TroveId)> = Vec::with_capacity(candidates.len());
        for &id in candidates {
            self.registry.trove(id)?;
            ordered.push((self.trove_reading(id)?.icr, id));
        }
        ordered.sort();

        let mut summary = LiquidationSummary::default();
        for (_, id) in ordered {
            if let Some(outcome) = self.liquidate_one(id, price)? {
                match outcome.mode {
                    LiquidationMode::Offset => {
                        summary.debt_offset = summary.debt_offset.saturating_add(outcome.debt);
                    }
                    LiquidationMode::Redistribution => {
                        summary.debt_redistributed =
                            summary.debt_redistributed.saturating_add(outcome.debt);
                    }
                }
                summary.collateral_seized =
                    summary.collateral_seized.saturating_add(outcome.collateral_seized);
                summary.surplus = summary.surplus.saturating_add(outcome.surplus);
                summary.liquidated.push(outcome);
            }
        }

        if summary.liquidated.is_empty() {
            return Err(Error::NoEligibleCandidates);
        }

        info!(
            count = summary.liquidated.len(),
            offset = summary.debt_offset.cents(),
            redistributed = summary.debt_redistributed.cents(),
            "liquidation complete"
        );
        Ok(summary)
    }

    fn liquidate_one(&mut self, id: TroveId, price: u64) -> Result<Option<LiquidatedTrove>> {
        if !self.registry.trove(id)?.is_active() {
            return Ok(None);
        }

        // Decide eligibility and the absorption path on the projected
        // settled position; skipped candidates leave no trace
        let report = self.registry.preview(id, self.now)?;
        let trove = self.registry.trove(id)?;
        let owner = trove.owner;
        let collateral = trove.collateral.saturating_add(report.redist_coll);
        let debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);
        let icr = collateral_ratio(collateral.base_units(), price, debt.cents());
        if icr >= self.params.mcr {
            return Ok(None);
        }

        let can_offset = self.stability.offset_capacity() >= debt && !debt.is_zero();
        if !can_offset && !self.registry.has_other_stakes(id) {
            warn!(%id, "no absorption path for undercollateralized trove; skipped");
            return Ok(None);
        }

        self.settle_position(id)?;
        let outcome = if can_offset {
            let (seized, surplus) = seize_amounts(
                collateral.base_units(),
                debt.cents(),
                price,
                self.params.sp_offset_penalty_bps,
            )?;
            let seized = CollateralAmount::from_base_units(seized);
            let surplus = CollateralAmount::from_base_units(surplus);

            self.stability.offset(debt, seized)?;
            self.ledger.burn(AccountId::STABILITY_POOL, debt)?;
            self.active.remove_debt(debt)?;
            self.active.remove_collateral(collateral)?;
            self.surplus.credit(owner, surplus);
            self.registry.close_trove(id, TroveStatus::Liquidated)?;

            LiquidatedTrove {
                id,
                owner,
                debt,
                collateral_seized: seized,
                surplus,
                mode: LiquidationMode::Offset,
            }
        } else {
            let (seized, surplus) = seize_amounts(
                collateral.base_units(),
                debt.cents(),
                price,
                self.params.redistribution_penalty_bps,
            )?;
            let seized = CollateralAmount::from_base_units(seized);
            let surplus = CollateralAmount::from_base_units(surplus);

            // Drop the trove's own stake before spreading its position
            self.registry.close_trove(id, TroveStatus::Liquidated)?;
            self.registry.redistribute(seized, debt)?;
            self.active.remove_debt(debt)?;
            self.active.remove_collateral(collateral)?;
            self.default_pool.add(seized, debt);
            self.surplus.credit(owner, surplus);

            LiquidatedTrove {
                id,
                owner,
                debt,
                collateral_seized: seized,
                surplus,
                mode: LiquidationMode::Redistribution,
            }
        };

        info!(
            %id, %owner,
            debt = debt.cents(),
            seized = outcome.collateral_seized.base_units(),
            surplus = outcome.surplus.base_units(),
            mode = ?outcome.mode,
            "trove liquidated"
        );
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProtocolParams;
    use crate::utils::constants::ONE_YEAR_SECS;

    const ALICE: AccountId = AccountId(10);
    const BOB: AccountId = AccountId(11);
    const CAROL: AccountId = AccountId(12);

    fn protocol_at(price_cents: u64) -> Protocol {
        let params = ProtocolParams {
            borrow_fee_floor_bps: 0,
            redemption_fee_floor_bps: 0,
            ..ProtocolParams::default()
        };
        let mut protocol = Protocol::new(params).unwrap();
        protocol.update_price(price_cents).unwrap();
        protocol
    }

    #[test]
    fn test_offset_liquidation() {
        let mut protocol = protocol_at(200_000);
        let risky = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();
        protocol
            .open_trove(
                BOB,
                CollateralAmount::from_units(100),
                TokenAmount::from_dollars(20_000),
                300,
            )
            .unwrap();
        protocol.provide_to_stability_pool(BOB, TokenAmount::from_dollars(10_000)).unwrap();

        // At $1400 the risky trove sits at ICR 105
        protocol.update_price(140_000).unwrap();
        let summary = protocol.liquidate(&[risky]).unwrap();

        assert_eq!(summary.liquidated.len(), 1);
        assert_eq!(summary.debt_offset, TokenAmount::from_dollars(4000));
        assert_eq!(summary.debt_redistributed, TokenAmount::ZERO);
        // Seize = 4000 * 1.05 / 1400 = exactly 3 units, no surplus
        assert_eq!(summary.collateral_seized, CollateralAmount::from_units(3));
        assert_eq!(summary.surplus, CollateralAmount::ZERO);
        assert_eq!(summary.liquidated[0].mode, LiquidationMode::Offset);

        // Debt burned from the pool, collateral now owed to depositors
        assert_eq!(protocol.total_supply(), TokenAmount::from_dollars(20_000));
        let reading = protocol.stability_reading(BOB);
        assert_eq!(reading.deposit, TokenAmount::from_dollars(6000));
        assert_eq!(reading.collateral_gain, CollateralAmount::from_units(3));
        assert_eq!(
            protocol.trove_reading(risky).unwrap().status,
            TroveStatus::Liquidated
        );
        protocol.check_conservation().unwrap();
    }

    #[test]
    fn test_offset_leaves_surplus() {
        let mut protocol = protocol_at(200_000);
        let risky = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();
        protocol
            .open_trove(
                BOB,
                CollateralAmount::from_units(100),
                TokenAmount::from_dollars(20_000),
                300,
            )
            .unwrap();
        protocol.provide_to_stability_pool(BOB, TokenAmount::from_dollars(10_000)).unwrap();

        // At $1450 ICR is 108; the 5% penalty leaves a sliver of surplus
        protocol.update_price(145_000).unwrap();
        let summary = protocol.liquidate(&[risky]).unwrap();

        assert_eq!(
            summary.collateral_seized,
            CollateralAmount::from_base_units(289_655_172)
        );
        assert_eq!(
            summary.surplus,
            CollateralAmount::from_base_units(10_344_828)
        );
        assert_eq!(
            protocol.surplus_of(ALICE),
            CollateralAmount::from_base_units(10_344_828)
        );

        // The former owner can claim it
        let claimed = protocol.claim_surplus(ALICE).unwrap();
        assert_eq!(claimed, CollateralAmount::from_base_units(10_344_828));
        assert!(protocol.surplus_of(ALICE).is_zero());
        protocol.check_conservation().unwrap();
    }

    #[test]
    fn test_redistribution_liquidation() {
        let mut protocol = protocol_at(200_000);
        let risky = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();
        let survivor = protocol
            .open_trove(
                BOB,
                CollateralAmount::from_units(10),
                TokenAmount::from_dollars(5000),
                300,
            )
            .unwrap();

        // Empty stability pool forces the redistribution path
        protocol.update_price(140_000).unwrap();
        let summary = protocol.liquidate(&[risky]).unwrap();

        assert_eq!(summary.debt_offset, TokenAmount::ZERO);
        assert_eq!(summary.debt_redistributed, TokenAmount::from_dollars(4000));
        // 10% penalty wants 4400/1400 = 3.14 units; capped at the whole 3
        assert_eq!(summary.collateral_seized, CollateralAmount::from_units(3));
        assert_eq!(summary.liquidated[0].mode, LiquidationMode::Redistribution);

        // Supply unchanged; debt now pending against the survivor
        assert_eq!(protocol.total_supply(), TokenAmount::from_dollars(9000));
        let reading = protocol.trove_reading(survivor).unwrap();
        assert_eq!(reading.debt, TokenAmount::from_dollars(9000));
        assert_eq!(reading.collateral, CollateralAmount::from_units(13));
        protocol.check_conservation().unwrap();

        // Settling folds the pending amounts into the recorded position
        protocol.settle_position(survivor).unwrap();
        protocol.check_conservation().unwrap();
    }

    #[test]
    fn test_healthy_candidates_are_skipped() {
        let mut protocol = protocol_at(200_000);
        let id = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();

        assert!(matches!(
            protocol.liquidate(&[id]),
            Err(Error::NoEligibleCandidates)
        ));
        assert!(matches!(
            protocol.liquidate(&[TroveId(99)]),
            Err(Error::NotFound { .. })
        ));
        protocol.check_conservation().unwrap();
    }

    #[test]
    fn test_skipped_candidates_leave_ledger_untouched() {
        let mut protocol = protocol_at(200_000);
        let id = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();
        protocol.advance_time(ONE_YEAR_SECS);

        // Settled debt would be $4120, ICR 145: still healthy, so the
        // failed call must not accrue interest as a side effect
        assert!(matches!(
            protocol.liquidate(&[id]),
            Err(Error::NoEligibleCandidates)
        ));
        assert_eq!(protocol.total_supply(), TokenAmount::from_dollars(4000));
        assert_eq!(
            protocol.balance_of(AccountId::TREASURY),
            TokenAmount::ZERO
        );
        protocol.check_conservation().unwrap();
    }

    #[test]
    fn test_last_trove_has_no_absorption_path() {
        let mut protocol = protocol_at(200_000);
        let only = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();

        protocol.update_price(140_000).unwrap();
        // Empty pool and no other stakes: nothing can absorb the debt
        assert!(matches!(
            protocol.liquidate(&[only]),
            Err(Error::NoEligibleCandidates)
        ));
        assert!(protocol.trove_reading(only).unwrap().status == TroveStatus::Active);
        protocol.check_conservation().unwrap();
    }

    #[test]
    fn test_candidates_processed_worst_first() {
        let mut protocol = protocol_at(200_000);
        let mid = protocol
            .open_trove(
                ALICE,
                CollateralAmount::from_base_units(310_000_000),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();
        let worst = protocol
            .open_trove(
                BOB,
                CollateralAmount::from_units(3),
                TokenAmount::from_dollars(4000),
                300,
            )
            .unwrap();
        protocol
            .open_trove(
                CAROL,
                CollateralAmount::from_units(100),
                TokenAmount::from_dollars(20_000),
                300,
            )
            .unwrap();
        protocol.provide_to_stability_pool(CAROL, TokenAmount::from_dollars(15_000)).unwrap();

        protocol.update_price(140_000).unwrap();
        let summary = protocol.liquidate(&[mid, worst]).unwrap();

        assert_eq!(summary.liquidated.len(), 2);
        assert_eq!(summary.liquidated[0].id, worst);
        assert_eq!(summary.liquidated[1].id, mid);
        protocol.check_conservation().unwrap();
    }
}
