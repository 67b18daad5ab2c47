//! fUSD token ledger and strongly-typed amounts.
//!
//! This module implements the fUSD stablecoin ledger:
//! - Token minting and burning
//! - Balance tracking by account
//! - Transfer operations
//! - Supply management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque account identifier for ledger balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl AccountId {
    /// Protocol treasury: receives borrowing fees, accrued interest and
    /// swept management fees
    pub const TREASURY: Self = Self(0);

    /// Reserved account holding the stability pool's fUSD
    pub const STABILITY_POOL: Self = Self(1);
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account-{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed fUSD amount in cents (prevents mixing debt and collateral)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from cents
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Create from dollars (for convenience)
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars * FUSD_BASE_UNIT)
    }

    /// Get raw cents value
    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Minimum of two amounts
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / FUSD_BASE_UNIT, self.0 % FUSD_BASE_UNIT)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed collateral amount in base units (1e8 per whole unit)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CollateralAmount(u64);

impl CollateralAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from base units
    pub const fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    /// Create from whole collateral units
    pub const fn from_units(units: u64) -> Self {
        Self(units * COLL_BASE_UNIT)
    }

    /// Get raw base units
    pub fn base_units(&self) -> u64 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Minimum of two amounts
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl std::fmt::Display for CollateralAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / COLL_BASE_UNIT,
            self.0 % COLL_BASE_UNIT
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUSD LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// The fUSD stablecoin ledger: balances by account plus the total supply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fusd {
    /// Total supply in cents
    total_supply: TokenAmount,
    /// Balances by account, ordered so snapshots serialize identically
    balances: BTreeMap<AccountId, TokenAmount>,
}

impl Fusd {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total supply
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Get balance of an account
    pub fn balance_of(&self, owner: AccountId) -> TokenAmount {
        self.balances.get(&owner).copied().unwrap_or(TokenAmount::ZERO)
    }

    /// Mint new tokens. Only trove and interest settlement paths call this.
    pub fn mint(&mut self, to: AccountId, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| Error::InvariantViolation("supply overflow on mint".into()))?;

        if new_supply.cents() > MAX_FUSD_SUPPLY {
            return Err(Error::InvalidAmount {
                reason: format!(
                    "mint would exceed supply cap: {} > {}",
                    new_supply.cents(),
                    MAX_FUSD_SUPPLY
                ),
            });
        }

        let balance = self.balance_of(to);
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| Error::InvariantViolation("balance overflow on mint".into()))?;

        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Burn tokens from an account
    pub fn burn(&mut self, from: AccountId, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let balance = self.balance_of(from);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.cents(),
                available: balance.cents(),
            });
        }

        let new_balance = balance.saturating_sub(amount);
        if new_balance.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, new_balance);
        }

        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }

    /// Transfer tokens between accounts
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() || from == to {
            return Ok(());
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.cents(),
                available: from_balance.cents(),
            });
        }

        let new_from = from_balance.saturating_sub(amount);
        if new_from.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, new_from);
        }

        let to_balance = self.balance_of(to);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or_else(|| Error::InvariantViolation("balance overflow on transfer".into()))?;
        self.balances.insert(to, new_to);

        Ok(())
    }

    /// Number of accounts with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Verify the supply invariant: total_supply equals the sum of balances
    pub fn verify_supply_invariant(&self) -> bool {
        let sum: u64 = self.balances.values().map(|b| b.cents()).sum();
        sum == self.total_supply.cents()
    }
}
