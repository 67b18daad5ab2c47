//! Collateral and debt pools.
//!
//! Three pools partition the collateral the system holds:
//! - [`ActivePool`]: collateral and recorded debt of open troves
//! - [`DefaultPool`]: debt and collateral redistributed from liquidations,
//!   pending per-trove application
//! - [`CollSurplusPool`]: leftover collateral claimable by former owners
//!
//! Pool balances never go negative; an underflow here means the callers'
//! accounting diverged and is reported as an invariant violation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::token::{AccountId, CollateralAmount, TokenAmount};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVE POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregate collateral and debt of all active troves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivePool {
    collateral: CollateralAmount,
    debt: TokenAmount,
}

impl ActivePool {
    /// Total collateral held for active troves
    pub fn collateral(&self) -> CollateralAmount {
        self.collateral
    }

    /// Total recorded debt of active troves
    pub fn debt(&self) -> TokenAmount {
        self.debt
    }

    /// Add collateral
    pub fn add_collateral(&mut self, amount: CollateralAmount) {
        self.collateral = self.collateral.saturating_add(amount);
    }

    /// Remove collateral
    pub fn remove_collateral(&mut self, amount: CollateralAmount) -> Result<()> {
        self.collateral = self
            .collateral
            .checked_sub(amount)
            .ok_or_else(|| Error::InvariantViolation("active pool collateral underflow".into()))?;
        Ok(())
    }

    /// Increase recorded debt
    pub fn add_debt(&mut self, amount: TokenAmount) {
        self.debt = self.debt.saturating_add(amount);
    }

    /// Decrease recorded debt
    pub fn remove_debt(&mut self, amount: TokenAmount) -> Result<()> {
        self.debt = self
            .debt
            .checked_sub(amount)
            .ok_or_else(|| Error::InvariantViolation("active pool debt underflow".into()))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Redistributed debt and collateral not yet applied to individual troves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultPool {
    collateral: CollateralAmount,
    debt: TokenAmount,
}

impl DefaultPool {
    /// Pending redistributed collateral
    pub fn collateral(&self) -> CollateralAmount {
        self.collateral
    }

    /// Pending redistributed debt
    pub fn debt(&self) -> TokenAmount {
        self.debt
    }

    /// Record a redistribution
    pub fn add(&mut self, collateral: CollateralAmount, debt: TokenAmount) {
        self.collateral = self.collateral.saturating_add(collateral);
        self.debt = self.debt.saturating_add(debt);
    }

    /// Move settled gains back toward the active pool
    pub fn remove(&mut self, collateral: CollateralAmount, debt: TokenAmount) -> Result<()> {
        self.collateral = self
            .collateral
            .checked_sub(collateral)
            .ok_or_else(|| Error::InvariantViolation("default pool collateral underflow".into()))?;
        self.debt = self
            .debt
            .checked_sub(debt)
            .ok_or_else(|| Error::InvariantViolation("default pool debt underflow".into()))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL SURPLUS POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Collateral left over after liquidations and full redemptions, claimable
/// by the trove's former owner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollSurplusPool {
    total: CollateralAmount,
    claims: BTreeMap<AccountId, CollateralAmount>,
}

impl CollSurplusPool {
    /// Total unclaimed surplus
    pub fn total(&self) -> CollateralAmount {
        self.total
    }

    /// Unclaimed surplus of one owner
    pub fn claimable(&self, owner: AccountId) -> CollateralAmount {
        self.claims.get(&owner).copied().unwrap_or(CollateralAmount::ZERO)
    }

    /// Credit surplus collateral to an owner
    pub fn credit(&mut self, owner: AccountId, amount: CollateralAmount) {
        if amount.is_zero() {
            return;
        }
        let entry = self.claims.entry(owner).or_insert(CollateralAmount::ZERO);
        *entry = entry.saturating_add(amount);
        self.total = self.total.saturating_add(amount);
    }

    /// Pay out and clear an owner's surplus
    pub fn claim(&mut self, owner: AccountId) -> Result<CollateralAmount> {
        let amount = self.claims.remove(&owner).ok_or(Error::NotFound {
            entity: "surplus claim",
            id: owner.0,
        })?;
        self.total = self
            .total
            .checked_sub(amount)
            .ok_or_else(|| Error::InvariantViolation("surplus pool underflow".into()))?;
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_pool_accounting() {
        let mut pool = ActivePool::default();
        pool.add_collateral(CollateralAmount::from_units(3));
        pool.add_debt(TokenAmount::from_dollars(4000));

        pool.remove_collateral(CollateralAmount::from_units(1)).unwrap();
        pool.remove_debt(TokenAmount::from_dollars(1000)).unwrap();

        assert_eq!(pool.collateral(), CollateralAmount::from_units(2));
        assert_eq!(pool.debt(), TokenAmount::from_dollars(3000));
    }

    #[test]
    fn test_active_pool_underflow_is_invariant_violation() {
        let mut pool = ActivePool::default();
        let result = pool.remove_collateral(CollateralAmount::from_units(1));
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_default_pool_roundtrip() {
        let mut pool = DefaultPool::default();
        pool.add(CollateralAmount::from_units(2), TokenAmount::from_dollars(500));
        pool.remove(CollateralAmount::from_units(1), TokenAmount::from_dollars(200)).unwrap();

        assert_eq!(pool.collateral(), CollateralAmount::from_units(1));
        assert_eq!(pool.debt(), TokenAmount::from_dollars(300));
    }

    #[test]
    fn test_surplus_claims() {
        let mut pool = CollSurplusPool::default();
        let owner = AccountId(7);

        pool.credit(owner, CollateralAmount::from_units(1));
        pool.credit(owner, CollateralAmount::from_units(1));
        assert_eq!(pool.claimable(owner), CollateralAmount::from_units(2));

        let claimed = pool.claim(owner).unwrap();
        assert_eq!(claimed, CollateralAmount::from_units(2));
        assert_eq!(pool.total(), CollateralAmount::ZERO);

        // Second claim has nothing left
        assert!(matches!(pool.claim(owner), Err(Error::NotFound { .. })));
    }
}
