//! Stability pool with product-sum depositor accounting.
//!
//! Deposits absorb liquidated debt pro rata and earn the seized collateral
//! in exchange. Instead of touching every deposit per liquidation, the pool
//! keeps a running product `P` (fraction of a unit deposit remaining) and
//! per-scale sums `S` (collateral earned per unit deposit). A deposit's
//! current value is derived from the snapshot it took at its last touch,
//! making each liquidation O(1).
//!
//! When `P` shrinks below `SP_PRECISION / SP_RESCALE` it is multiplied by
//! `SP_RESCALE` and the scale index increments; a deposit more than
//! [`SP_SCALE_SPAN`] scales old reads as fully consumed. The engine never
//! offsets the last [`MIN_SP_REMAINDER`] cents, so `P` stays positive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::token::{AccountId, CollateralAmount, TokenAmount};
use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// DEPOSIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Pool state captured when a deposit was last touched
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepositSnapshot {
    /// Product factor at the touch
    pub p: u128,
    /// Sum factor at the touch, within `scale`
    pub s: u128,
    /// Scale index at the touch
    pub scale: u64,
}

/// A single stability deposit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    /// Recorded amount at the last touch, in cents
    pub initial: TokenAmount,
    /// Snapshot at the last touch
    pub snapshot: DepositSnapshot,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STABILITY POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// The stability pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityPool {
    /// Remaining deposited fUSD, in cents
    total_deposits: TokenAmount,
    /// Seized collateral held for depositors
    total_collateral: CollateralAmount,
    /// Product factor, scaled by SP_PRECISION
    p: u128,
    /// Current scale index
    current_scale: u64,
    /// Sum factor per scale index
    scale_to_s: BTreeMap<u64, u128>,
    /// Deposits by account
    deposits: BTreeMap<AccountId, Deposit>,
    /// Liquidations absorbed
    total_offsets: u64,
    /// Debt absorbed across all offsets
    total_debt_offset: TokenAmount,
}

impl Default for StabilityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StabilityPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            total_deposits: TokenAmount::ZERO,
            total_collateral: CollateralAmount::ZERO,
            p: SP_PRECISION,
            current_scale: 0,
            scale_to_s: BTreeMap::new(),
            deposits: BTreeMap::new(),
            total_offsets: 0,
            total_debt_offset: TokenAmount::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DEPOSIT VALUATION
    // ═══════════════════════════════════════════════════════════════════════════

    fn compounded(&self, deposit: &Deposit) -> TokenAmount {
        let scale_diff = self.current_scale - deposit.snapshot.scale;
        if scale_diff >= SP_SCALE_SPAN {
            return TokenAmount::ZERO;
        }

        let mut value = (deposit.initial.cents() as u128) * self.p / deposit.snapshot.p;
        if scale_diff == 1 {
            value /= SP_RESCALE;
        }
        TokenAmount::from_cents(value as u64)
    }

    fn gain(&self, deposit: &Deposit) -> CollateralAmount {
        let s_at = |scale: u64| self.scale_to_s.get(&scale).copied().unwrap_or(0);

        // Gains accrued within the snapshot's scale, plus the following
        // scale shrunk by the rescale factor
        let within = s_at(deposit.snapshot.scale).saturating_sub(deposit.snapshot.s);
        let next = s_at(deposit.snapshot.scale + 1) / SP_RESCALE;

        let gain = (deposit.initial.cents() as u128) * (within + next) / deposit.snapshot.p;
        CollateralAmount::from_base_units(gain as u64)
    }

    fn snapshot_now(&self) -> DepositSnapshot {
        DepositSnapshot {
            p: self.p,
            s: self.scale_to_s.get(&self.current_scale).copied().unwrap_or(0),
            scale: self.current_scale,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DEPOSITS AND WITHDRAWALS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add to (or open) a deposit. Pending collateral gains are paid out
    /// first; the returned amount has left the pool.
    pub fn provide(&mut self, owner: AccountId, amount: TokenAmount) -> Result<CollateralAmount> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount {
                reason: "stability deposit cannot be zero".into(),
            });
        }

        let (remaining, gain) = match self.deposits.get(&owner) {
            Some(deposit) => (self.compounded(deposit), self.gain(deposit)),
            None => (TokenAmount::ZERO, CollateralAmount::ZERO),
        };

        self.deposits.insert(
            owner,
            Deposit {
                initial: remaining.saturating_add(amount),
                snapshot: self.snapshot_now(),
            },
        );
        self.total_deposits = self.total_deposits.saturating_add(amount);
        self.total_collateral = self
            .total_collateral
            .checked_sub(gain)
            .ok_or_else(|| Error::InvariantViolation("stability pool gain underflow".into()))?;

        Ok(gain)
    }

    /// Withdraw up to the realizable value of a deposit. Returns the
    /// collateral gain paid out alongside.
    pub fn withdraw(
        &mut self,
        owner: AccountId,
        amount: TokenAmount,
    ) -> Result<CollateralAmount> {
        let deposit = self.deposits.get(&owner).ok_or(Error::NotFound {
            entity: "stability deposit",
            id: owner.0,
        })?;

        let remaining = self.compounded(deposit);
        if amount > remaining {
            return Err(Error::InsufficientBalance {
                required: amount.cents(),
                available: remaining.cents(),
            });
        }
        let gain = self.gain(deposit);

        let left = remaining.saturating_sub(amount);
        if left.is_zero() {
            self.deposits.remove(&owner);
        } else {
            self.deposits.insert(
                owner,
                Deposit {
                    initial: left,
                    snapshot: self.snapshot_now(),
                },
            );
        }

        self.total_deposits = self.total_deposits.saturating_sub(amount);
        self.total_collateral = self
            .total_collateral
            .checked_sub(gain)
            .ok_or_else(|| Error::InvariantViolation("stability pool gain underflow".into()))?;

        Ok(gain)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LIQUIDATION OFFSET
    // ═══════════════════════════════════════════════════════════════════════════

    /// Debt the pool can absorb right now. A minimum remainder is held
    /// back so the product factor never reaches zero.
    pub fn offset_capacity(&self) -> TokenAmount {
        self.total_deposits
            .saturating_sub(TokenAmount::from_cents(MIN_SP_REMAINDER))
    }

    /// Absorb liquidated debt and take the seized collateral. The caller
    /// checks [`Self::offset_capacity`] first.
    pub fn offset(&mut self, debt: TokenAmount, collateral: CollateralAmount) -> Result<()> {
        let total = self.total_deposits.cents() as u128;
        if debt > self.offset_capacity() {
            return Err(Error::InvariantViolation(
                "offset beyond stability pool capacity".into(),
            ));
        }

        // Collateral earned per unit deposit, carried through P so older
        // snapshots stay comparable
        let s_increment = (collateral.base_units() as u128) * self.p / total;
        *self.scale_to_s.entry(self.current_scale).or_insert(0) += s_increment;

        // P shrinks by the fraction of deposits consumed
        let mut new_p = self.p * (total - debt.cents() as u128) / total;
        while new_p < SP_PRECISION / SP_RESCALE {
            new_p *= SP_RESCALE;
            self.current_scale += 1;
        }
        self.p = new_p;

        self.total_deposits = self.total_deposits.saturating_sub(debt);
        self.total_collateral = self.total_collateral.saturating_add(collateral);
        self.total_offsets += 1;
        self.total_debt_offset = self.total_debt_offset.saturating_add(debt);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remaining deposited fUSD
    pub fn total_deposits(&self) -> TokenAmount {
        self.total_deposits
    }

    /// Seized collateral held for depositors
    pub fn total_collateral(&self) -> CollateralAmount {
        self.total_collateral
    }

    /// Realizable value of an account's deposit
    pub fn compounded_deposit(&self, owner: AccountId) -> TokenAmount {
        self.deposits
            .get(&owner)
            .map(|d| self.compounded(d))
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Unrealized collateral gain of an account's deposit
    pub fn collateral_gain(&self, owner: AccountId) -> CollateralAmount {
        self.deposits
            .get(&owner)
            .map(|d| self.gain(d))
            .unwrap_or(CollateralAmount::ZERO)
    }

    /// Number of open deposits
    pub fn depositor_count(&self) -> usize {
        self.deposits.len()
    }

    /// Liquidations absorbed so far
    pub fn total_offsets(&self) -> u64 {
        self.total_offsets
    }

    /// Debt absorbed so far
    pub fn total_debt_offset(&self) -> TokenAmount {
        self.total_debt_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = AccountId(10);
    const BOB: AccountId = AccountId(11);

    #[test]
    fn test_provide_and_withdraw() {
        let mut pool = StabilityPool::new();

        pool.provide(ALICE, TokenAmount::from_dollars(1000)).unwrap();
        assert_eq!(pool.total_deposits(), TokenAmount::from_dollars(1000));
        assert_eq!(pool.compounded_deposit(ALICE), TokenAmount::from_dollars(1000));

        let gain = pool.withdraw(ALICE, TokenAmount::from_dollars(400)).unwrap();
        assert_eq!(gain, CollateralAmount::ZERO);
        assert_eq!(pool.compounded_deposit(ALICE), TokenAmount::from_dollars(600));
        assert_eq!(pool.total_deposits(), TokenAmount::from_dollars(600));
    }

    #[test]
    fn test_withdraw_beyond_deposit_fails() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(100)).unwrap();

        let result = pool.withdraw(ALICE, TokenAmount::from_dollars(200));
        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));

        assert!(matches!(
            pool.withdraw(BOB, TokenAmount::from_dollars(1)),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_offset_shrinks_deposits_and_pays_gains() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(1000)).unwrap();

        // Absorb $400 of debt against 0.21 units of collateral
        pool.offset(
            TokenAmount::from_dollars(400),
            CollateralAmount::from_base_units(21_000_000),
        )
        .unwrap();

        assert_eq!(pool.total_deposits(), TokenAmount::from_dollars(600));
        assert_eq!(pool.compounded_deposit(ALICE), TokenAmount::from_dollars(600));
        assert_eq!(
            pool.collateral_gain(ALICE),
            CollateralAmount::from_base_units(21_000_000)
        );
    }

    #[test]
    fn test_offset_splits_pro_rata() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(3000)).unwrap();
        pool.provide(BOB, TokenAmount::from_dollars(1000)).unwrap();

        pool.offset(
            TokenAmount::from_dollars(400),
            CollateralAmount::from_base_units(20_000_000),
        )
        .unwrap();

        // 3:1 split of both loss and gain
        assert_eq!(pool.compounded_deposit(ALICE), TokenAmount::from_dollars(2700));
        assert_eq!(pool.compounded_deposit(BOB), TokenAmount::from_dollars(900));
        assert_eq!(
            pool.collateral_gain(ALICE),
            CollateralAmount::from_base_units(15_000_000)
        );
        assert_eq!(
            pool.collateral_gain(BOB),
            CollateralAmount::from_base_units(5_000_000)
        );
    }

    #[test]
    fn test_monotonic_depletion() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(1000)).unwrap();

        let mut last = pool.compounded_deposit(ALICE);
        for _ in 0..5 {
            pool.offset(
                TokenAmount::from_dollars(150),
                CollateralAmount::from_base_units(8_000_000),
            )
            .unwrap();
            let now = pool.compounded_deposit(ALICE);
            assert!(now <= last, "deposit must never grow from an offset");
            last = now;
        }
        assert!(last > TokenAmount::ZERO);
    }

    #[test]
    fn test_offset_capacity_reserves_remainder() {
        let mut pool = StabilityPool::new();
        assert_eq!(pool.offset_capacity(), TokenAmount::ZERO);

        pool.provide(ALICE, TokenAmount::from_dollars(100)).unwrap();
        assert_eq!(
            pool.offset_capacity(),
            TokenAmount::from_cents(100 * FUSD_BASE_UNIT - MIN_SP_REMAINDER)
        );

        // Offsetting beyond capacity is an internal error
        let result = pool.offset(
            TokenAmount::from_dollars(100),
            CollateralAmount::from_base_units(1),
        );
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_full_drain_leaves_remainder() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(1_000_000)).unwrap();

        let capacity = pool.offset_capacity();
        pool.offset(capacity, CollateralAmount::from_units(500)).unwrap();

        assert_eq!(
            pool.total_deposits(),
            TokenAmount::from_cents(MIN_SP_REMAINDER)
        );
        // Depositor keeps the dust and the whole gain
        let left = pool.compounded_deposit(ALICE);
        assert!(left <= TokenAmount::from_cents(MIN_SP_REMAINDER));
        let gain = pool.collateral_gain(ALICE);
        assert!(gain <= CollateralAmount::from_units(500));
        assert!(gain >= CollateralAmount::from_base_units(499 * COLL_BASE_UNIT));
    }

    #[test]
    fn test_rescale_zeroes_stale_deposits() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(1_000_000)).unwrap();

        // Two near-total drains in a row push P through two rescales
        for _ in 0..2 {
            let capacity = pool.offset_capacity();
            pool.offset(capacity, CollateralAmount::from_units(100)).unwrap();
            pool.provide(BOB, TokenAmount::from_dollars(1_000_000)).unwrap();
            let capacity = pool.offset_capacity();
            pool.offset(capacity, CollateralAmount::from_units(100)).unwrap();
        }

        // Alice's snapshot is several scales old: realizable value is zero
        assert_eq!(pool.compounded_deposit(ALICE), TokenAmount::ZERO);
        // But her gain from the first drain is still payable
        assert!(pool.collateral_gain(ALICE) > CollateralAmount::ZERO);
    }

    #[test]
    fn test_provide_realizes_pending_gain() {
        let mut pool = StabilityPool::new();
        pool.provide(ALICE, TokenAmount::from_dollars(1000)).unwrap();
        pool.offset(
            TokenAmount::from_dollars(200),
            CollateralAmount::from_base_units(10_500_000),
        )
        .unwrap();

        let paid = pool.provide(ALICE, TokenAmount::from_dollars(500)).unwrap();
        assert_eq!(paid, CollateralAmount::from_base_units(10_500_000));
        // Gain is gone after the touch, deposit restated
        assert_eq!(pool.collateral_gain(ALICE), CollateralAmount::ZERO);
        assert_eq!(pool.compounded_deposit(ALICE), TokenAmount::from_dollars(1300));
    }
}
