//! Trove and batch registry.
//!
//! Troves are collateralized debt positions kept in an arena keyed by
//! opaque ids. The registry also owns the redistribution machinery:
//! per-unit-stake accumulators that spread a liquidated trove's debt and
//! collateral across all remaining troves lazily. Each trove carries a
//! snapshot of the accumulators from its last touch; the difference times
//! its stake is the gain it has not yet realized.
//!
//! Closed and liquidated troves stay in the arena as records with zero
//! collateral and debt.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::interest::accrued_interest;
use crate::core::token::{AccountId, CollateralAmount, TokenAmount};
use crate::error::{Error, Result};
use crate::utils::constants::REDIST_PRECISION;
use crate::utils::math::collateral_ratio;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque trove identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TroveId(pub u64);

impl std::fmt::Display for TroveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trove-{}", self.0)
    }
}

/// Opaque batch identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub u64);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TROVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifecycle status of a trove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TroveStatus {
    /// Open and carrying debt
    Active,
    /// Closed voluntarily by its owner or via full redemption
    Closed,
    /// Closed by the liquidation engine
    Liquidated,
}

impl TroveStatus {
    /// Terminal states admit no further operations
    pub fn is_terminal(&self) -> bool {
        matches!(self, TroveStatus::Closed | TroveStatus::Liquidated)
    }
}

/// Redistribution accumulator snapshot taken at the trove's last touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSnapshot {
    /// Collateral accumulator value
    pub coll: u128,
    /// Debt accumulator value
    pub debt: u128,
}

/// A collateralized debt position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trove {
    /// Unique identifier
    pub id: TroveId,
    /// Owning account
    pub owner: AccountId,
    /// Collateral backing the position
    pub collateral: CollateralAmount,
    /// Recorded debt, including settled interest and redistribution gains
    pub debt: TokenAmount,
    /// Annual interest rate in basis points; mirrors the batch rate while
    /// the trove is a batch member
    pub rate_bps: u64,
    /// Timestamp of the last settlement
    pub last_accrual: u64,
    /// Lifecycle status
    pub status: TroveStatus,
    /// Batch membership, if any
    pub batch: Option<BatchId>,
    /// Collateral stake counted in the redistribution denominator
    pub stake: CollateralAmount,
    /// Accumulator snapshot from the last touch
    pub reward_snapshot: RewardSnapshot,
}

impl Trove {
    /// Whether the trove is open
    pub fn is_active(&self) -> bool {
        self.status == TroveStatus::Active
    }

    /// Individual collateralization ratio at a price, as a percentage.
    /// Uses recorded values only; callers settle first when pending
    /// gains or interest matter.
    pub fn icr(&self, price_cents: u64) -> u64 {
        collateral_ratio(self.collateral.base_units(), price_cents, self.debt.cents())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// A group of troves sharing one interest rate, managed for a fee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Unique identifier
    pub id: BatchId,
    /// Shared annual interest rate in basis points
    pub rate_bps: u64,
    /// Annual management fee in basis points, accrued on member debt
    pub management_fee_bps: u64,
    /// Member troves
    pub members: BTreeSet<TroveId>,
    /// Management fees accrued but not yet swept
    pub accrued_fees: TokenAmount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SETTLEMENT REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// What a settlement applied to a trove
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Redistributed collateral moved into the trove
    pub redist_coll: CollateralAmount,
    /// Redistributed debt moved into the trove
    pub redist_debt: TokenAmount,
    /// Interest added to the trove's debt
    pub interest: TokenAmount,
    /// Management fee accrued to the trove's batch
    pub management_fee: TokenAmount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Arena of troves and batches plus the redistribution accumulators
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TroveRegistry {
    troves: BTreeMap<TroveId, Trove>,
    batches: BTreeMap<BatchId, Batch>,
    next_trove_id: u64,
    next_batch_id: u64,
    /// Sum of stakes of all active troves
    total_stakes: CollateralAmount,
    /// Collateral redistributed per unit stake, scaled by REDIST_PRECISION
    l_coll: u128,
    /// Debt redistributed per unit stake, scaled by REDIST_PRECISION
    l_debt: u128,
    /// Integer-division remainders carried into the next redistribution
    last_coll_error: u128,
    last_debt_error: u128,
}

impl TroveRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TROVE LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create a new active trove. Caller has already validated amounts
    /// and ratios.
    pub fn create_trove(
        &mut self,
        owner: AccountId,
        collateral: CollateralAmount,
        debt: TokenAmount,
        rate_bps: u64,
        now: u64,
    ) -> TroveId {
        let id = TroveId(self.next_trove_id);
        self.next_trove_id += 1;

        let trove = Trove {
            id,
            owner,
            collateral,
            debt,
            rate_bps,
            last_accrual: now,
            status: TroveStatus::Active,
            batch: None,
            stake: collateral,
            reward_snapshot: RewardSnapshot {
                coll: self.l_coll,
                debt: self.l_debt,
            },
        };
        self.total_stakes = self.total_stakes.saturating_add(collateral);
        self.troves.insert(id, trove);
        id
    }

    /// Look up a trove
    pub fn trove(&self, id: TroveId) -> Result<&Trove> {
        self.troves.get(&id).ok_or(Error::NotFound {
            entity: "trove",
            id: id.0,
        })
    }

    /// Look up a trove mutably
    pub fn trove_mut(&mut self, id: TroveId) -> Result<&mut Trove> {
        self.troves.get_mut(&id).ok_or(Error::NotFound {
            entity: "trove",
            id: id.0,
        })
    }

    /// Look up a trove and require it to be active
    pub fn active_trove(&self, id: TroveId) -> Result<&Trove> {
        let trove = self.trove(id)?;
        if !trove.is_active() {
            return Err(Error::InvalidState(format!("{} is not active", id)));
        }
        Ok(trove)
    }

    /// Close a trove, removing its stake and batch membership. The caller
    /// has already routed its collateral and debt.
    pub fn close_trove(&mut self, id: TroveId, status: TroveStatus) -> Result<()> {
        debug_assert!(status.is_terminal());
        let trove = self.troves.get_mut(&id).ok_or(Error::NotFound {
            entity: "trove",
            id: id.0,
        })?;

        self.total_stakes = self.total_stakes.saturating_sub(trove.stake);
        trove.stake = CollateralAmount::ZERO;
        trove.collateral = CollateralAmount::ZERO;
        trove.debt = TokenAmount::ZERO;
        trove.status = status;

        if let Some(batch_id) = trove.batch.take() {
            if let Some(batch) = self.batches.get_mut(&batch_id) {
                batch.members.remove(&id);
            }
        }
        Ok(())
    }

    /// Refresh a trove's stake after its collateral changed
    pub fn update_stake(&mut self, id: TroveId) -> Result<()> {
        let trove = self.troves.get_mut(&id).ok_or(Error::NotFound {
            entity: "trove",
            id: id.0,
        })?;
        self.total_stakes = self.total_stakes.saturating_sub(trove.stake);
        trove.stake = trove.collateral;
        self.total_stakes = self.total_stakes.saturating_add(trove.stake);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SETTLEMENT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Pending redistribution gains a trove has not yet realized
    pub fn pending_rewards(&self, trove: &Trove) -> (CollateralAmount, TokenAmount) {
        if trove.stake.is_zero() {
            return (CollateralAmount::ZERO, TokenAmount::ZERO);
        }
        let stake = trove.stake.base_units() as u128;
        let coll_gain = stake * (self.l_coll - trove.reward_snapshot.coll) / REDIST_PRECISION;
        let debt_gain = stake * (self.l_debt - trove.reward_snapshot.debt) / REDIST_PRECISION;
        (
            CollateralAmount::from_base_units(coll_gain as u64),
            TokenAmount::from_cents(debt_gain as u64),
        )
    }

    /// Compute what [`Self::settle`] would apply, without mutating
    pub fn preview(&self, id: TroveId, now: u64) -> Result<SettleReport> {
        let trove = self.trove(id)?;
        if !trove.is_active() {
            return Ok(SettleReport::default());
        }
        let (redist_coll, redist_debt) = self.pending_rewards(trove);

        let elapsed = now.saturating_sub(trove.last_accrual);
        let base = trove.debt.saturating_add(redist_debt);
        let interest =
            TokenAmount::from_cents(accrued_interest(base.cents(), trove.rate_bps, elapsed));

        let management_fee = match trove.batch {
            Some(batch_id) => {
                let batch = self.batch(batch_id)?;
                TokenAmount::from_cents(accrued_interest(
                    base.cents(),
                    batch.management_fee_bps,
                    elapsed,
                ))
            }
            None => TokenAmount::ZERO,
        };

        Ok(SettleReport {
            redist_coll,
            redist_debt,
            interest,
            management_fee,
        })
    }

    /// Settle a trove: apply pending redistribution gains, accrue interest
    /// (and the batch management fee) up to `now`, refresh the stake and
    /// stamp the accrual time. Idempotent at a fixed timestamp.
    pub fn settle(&mut self, id: TroveId, now: u64) -> Result<SettleReport> {
        let report = self.preview(id, now)?;

        let l_coll = self.l_coll;
        let l_debt = self.l_debt;
        let trove = self.trove_mut(id)?;
        if !trove.is_active() {
            return Ok(report);
        }

        trove.collateral = trove.collateral.saturating_add(report.redist_coll);
        trove.debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);
        trove.reward_snapshot = RewardSnapshot {
            coll: l_coll,
            debt: l_debt,
        };
        trove.last_accrual = now;

        let batch = trove.batch;
        self.update_stake(id)?;

        if let Some(batch_id) = batch {
            let batch = self.batch_mut(batch_id)?;
            batch.accrued_fees = batch.accrued_fees.saturating_add(report.management_fee);
        }
        Ok(report)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REDISTRIBUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Spread a liquidated trove's debt and collateral over all remaining
    /// stakes. The liquidated trove's own stake must already be removed.
    ///
    /// Division remainders are carried into the next call so nothing is
    /// lost to truncation over a sequence of redistributions.
    pub fn redistribute(&mut self, coll: CollateralAmount, debt: TokenAmount) -> Result<()> {
        let stakes = self.total_stakes.base_units() as u128;
        if stakes == 0 {
            return Err(Error::InvariantViolation(
                "redistribution with no remaining stakes".into(),
            ));
        }

        let coll_numerator =
            (coll.base_units() as u128) * REDIST_PRECISION + self.last_coll_error;
        let coll_per_stake = coll_numerator / stakes;
        self.last_coll_error = coll_numerator - coll_per_stake * stakes;
        self.l_coll += coll_per_stake;

        let debt_numerator = (debt.cents() as u128) * REDIST_PRECISION + self.last_debt_error;
        let debt_per_stake = debt_numerator / stakes;
        self.last_debt_error = debt_numerator - debt_per_stake * stakes;
        self.l_debt += debt_per_stake;

        Ok(())
    }

    /// Whether any stake exists beyond the given trove's
    pub fn has_other_stakes(&self, id: TroveId) -> bool {
        match self.troves.get(&id) {
            Some(trove) => self.total_stakes.saturating_sub(trove.stake) > CollateralAmount::ZERO,
            None => self.total_stakes > CollateralAmount::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BATCHES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create a new batch
    pub fn create_batch(&mut self, rate_bps: u64, management_fee_bps: u64) -> BatchId {
        let id = BatchId(self.next_batch_id);
        self.next_batch_id += 1;
        self.batches.insert(
            id,
            Batch {
                id,
                rate_bps,
                management_fee_bps,
                members: BTreeSet::new(),
                accrued_fees: TokenAmount::ZERO,
            },
        );
        id
    }

    /// Look up a batch
    pub fn batch(&self, id: BatchId) -> Result<&Batch> {
        self.batches.get(&id).ok_or(Error::NotFound {
            entity: "batch",
            id: id.0,
        })
    }

    /// Look up a batch mutably
    pub fn batch_mut(&mut self, id: BatchId) -> Result<&mut Batch> {
        self.batches.get_mut(&id).ok_or(Error::NotFound {
            entity: "batch",
            id: id.0,
        })
    }

    /// Record batch membership and restamp the trove to the batch rate.
    /// The caller settles the trove at its old rate first and enforces the
    /// join ratio.
    pub fn join_batch(&mut self, trove_id: TroveId, batch_id: BatchId) -> Result<()> {
        let rate_bps = self.batch(batch_id)?.rate_bps;
        let trove = self.trove_mut(trove_id)?;
        if trove.batch.is_some() {
            return Err(Error::InvalidState(format!(
                "{} is already in a batch",
                trove_id
            )));
        }
        trove.batch = Some(batch_id);
        trove.rate_bps = rate_bps;

        self.batch_mut(batch_id)?.members.insert(trove_id);
        Ok(())
    }

    /// Remove a trove from its batch. The trove keeps the batch rate as
    /// its personal rate.
    pub fn leave_batch(&mut self, trove_id: TroveId) -> Result<()> {
        let trove = self.trove_mut(trove_id)?;
        let batch_id = trove.batch.take().ok_or_else(|| {
            Error::InvalidState(format!("{} is not in a batch", trove_id))
        })?;
        self.batch_mut(batch_id)?.members.remove(&trove_id);
        Ok(())
    }

    /// Drain a batch's accrued management fees
    pub fn take_batch_fees(&mut self, batch_id: BatchId) -> Result<TokenAmount> {
        let batch = self.batch_mut(batch_id)?;
        let fees = batch.accrued_fees;
        batch.accrued_fees = TokenAmount::ZERO;
        Ok(fees)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Ids of all active troves, in id order
    pub fn active_trove_ids(&self) -> Vec<TroveId> {
        let mut ids: Vec<TroveId> = self
            .troves
            .values()
            .filter(|t| t.is_active())
            .map(|t| t.id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of active troves
    pub fn active_count(&self) -> usize {
        self.troves.values().filter(|t| t.is_active()).count()
    }

    /// Sum of active stakes
    pub fn total_stakes(&self) -> CollateralAmount {
        self.total_stakes
    }
}
