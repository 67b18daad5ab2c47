//! Protocol facade - the single entry point for state transitions.
//!
//! One [`Protocol`] value owns the whole ledger: trove registry, pools,
//! stability pool, token ledger and fee state, plus the externally-driven
//! clock and price. All mutations go through its methods, one at a time;
//! each validates its preconditions before touching anything, so a
//! returned error means nothing changed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::ProtocolParams;
use crate::core::fees::FeeState;
use crate::core::pools::{ActivePool, CollSurplusPool, DefaultPool};
use crate::core::token::{AccountId, CollateralAmount, Fusd, TokenAmount};
use crate::core::trove::{BatchId, SettleReport, TroveId, TroveRegistry, TroveStatus};
use crate::error::{Error, Result};
use crate::liquidation::stability_pool::StabilityPool;
use crate::utils::math::{collateral_ratio, fee_on, safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL
// ═══════════════════════════════════════════════════════════════════════════════

/// The whole protocol ledger behind one synchronous API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protocol {
    pub(crate) params: ProtocolParams,
    pub(crate) registry: TroveRegistry,
    pub(crate) active: ActivePool,
    pub(crate) default_pool: DefaultPool,
    pub(crate) surplus: CollSurplusPool,
    pub(crate) stability: StabilityPool,
    pub(crate) ledger: Fusd,
    pub(crate) fees: FeeState,
    /// Current price of one whole collateral unit, in cents; zero until set
    pub(crate) price: u64,
    /// Current logical time, seconds
    pub(crate) now: u64,
    /// Cumulative collateral that ever entered the system
    pub(crate) coll_in: CollateralAmount,
    /// Cumulative collateral paid back out
    pub(crate) coll_out: CollateralAmount,
    /// Management fees minted without matching debt
    pub(crate) management_fees_minted: TokenAmount,
}

impl Protocol {
    /// Create a fresh ledger with the given parameters
    pub fn new(params: ProtocolParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            registry: TroveRegistry::new(),
            active: ActivePool::default(),
            default_pool: DefaultPool::default(),
            surplus: CollSurplusPool::default(),
            stability: StabilityPool::new(),
            ledger: Fusd::new(),
            fees: FeeState::new(),
            price: 0,
            now: 0,
            coll_in: CollateralAmount::ZERO,
            coll_out: CollateralAmount::ZERO,
            management_fees_minted: TokenAmount::ZERO,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLOCK AND PRICE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Advance the logical clock
    pub fn advance_time(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
    }

    /// Set the current collateral price in cents per whole unit
    pub fn update_price(&mut self, price_cents: u64) -> Result<()> {
        if price_cents == 0 {
            return Err(Error::InvalidAmount {
                reason: "price cannot be zero".into(),
            });
        }
        debug!(price_cents, "price updated");
        self.price = price_cents;
        Ok(())
    }

    fn require_price(&self) -> Result<u64> {
        if self.price == 0 {
            return Err(Error::InvalidState("price has not been set".into()));
        }
        Ok(self.price)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SETTLEMENT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Settle a trove and route the results: redistribution gains move
    /// from the default pool to the active pool, accrued interest becomes
    /// active debt and mints to the treasury.
    pub(crate) fn settle_position(&mut self, id: TroveId) -> Result<SettleReport> {
        let report = self.registry.settle(id, self.now)?;

        self.default_pool.remove(report.redist_coll, report.redist_debt)?;
        self.active.add_collateral(report.redist_coll);
        self.active.add_debt(report.redist_debt);

        self.active.add_debt(report.interest);
        self.ledger.mint(AccountId::TREASURY, report.interest)?;

        Ok(report)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TROVE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Open a trove: lock collateral, record `debt`, mint `debt` minus the
    /// borrowing fee to the owner and the fee to the treasury
    pub fn open_trove(
        &mut self,
        owner: AccountId,
        collateral: CollateralAmount,
        debt: TokenAmount,
        rate_bps: u64,
    ) -> Result<TroveId> {
        let price = self.require_price()?;

        if collateral.is_zero() {
            return Err(Error::InvalidAmount {
                reason: "collateral cannot be zero".into(),
            });
        }
        if debt < self.params.min_debt {
            return Err(Error::InvalidAmount {
                reason: format!(
                    "debt {} below minimum {}",
                    debt.cents(),
                    self.params.min_debt.cents()
                ),
            });
        }
        self.check_rate(rate_bps)?;

        let icr = collateral_ratio(collateral.base_units(), price, debt.cents());
        if icr < self.params.mcr {
            return Err(Error::InsufficientCollateralization {
                current: icr,
                required: self.params.mcr,
            });
        }
        let tcr_after = self.tcr_with(
            safe_add(self.system_collateral().base_units(), collateral.base_units())?,
            safe_add(self.system_debt().cents(), debt.cents())?,
        );
        if tcr_after < self.params.ccr {
            return Err(Error::InsufficientCollateralization {
                current: tcr_after,
                required: self.params.ccr,
            });
        }

        let fee_rate = self.fees.borrowing_rate(self.now, &self.params);
        let fee = TokenAmount::from_cents(fee_on(debt.cents(), fee_rate)?);

        let id = self.registry.create_trove(owner, collateral, debt, rate_bps, self.now);
        self.active.add_collateral(collateral);
        self.active.add_debt(debt);
        self.coll_in = self.coll_in.saturating_add(collateral);

        self.ledger.mint(owner, debt.saturating_sub(fee))?;
        self.ledger.mint(AccountId::TREASURY, fee)?;
        self.fees.record_borrowing(fee);

        info!(%id, %owner, coll = collateral.base_units(), debt = debt.cents(), rate_bps, "trove opened");
        Ok(id)
    }

    /// Adjust a trove's collateral and debt by signed deltas (base units
    /// and cents). Validated against the settled position; a repayment
    /// burns from the owner.
    pub fn adjust_trove(&mut self, id: TroveId, coll_delta: i64, debt_delta: i64) -> Result<()> {
        let price = self.require_price()?;
        if coll_delta == 0 && debt_delta == 0 {
            return Err(Error::InvalidAmount {
                reason: "adjustment with no change".into(),
            });
        }

        self.registry.active_trove(id)?;

        // Judge the deltas against what settlement will produce, without
        // mutating anything until every check has passed
        let report = self.registry.preview(id, self.now)?;
        let trove = self.registry.trove(id)?;
        let owner = trove.owner;
        let settled_coll = trove.collateral.saturating_add(report.redist_coll);
        let settled_debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);

        let new_coll = apply_delta(settled_coll.base_units(), coll_delta, "collateral")?;
        let new_debt = apply_delta(settled_debt.cents(), debt_delta, "debt")?;
        if new_coll == 0 {
            return Err(Error::InvalidAmount {
                reason: "cannot withdraw all collateral; close the trove instead".into(),
            });
        }
        if new_debt < self.params.min_debt.cents() {
            return Err(Error::InvalidAmount {
                reason: format!(
                    "debt {} below minimum {}; close the trove instead",
                    new_debt,
                    self.params.min_debt.cents()
                ),
            });
        }

        let icr = collateral_ratio(new_coll, price, new_debt);
        if icr < self.params.mcr {
            return Err(Error::InsufficientCollateralization {
                current: icr,
                required: self.params.mcr,
            });
        }

        // Debt increases pay the borrowing fee and must preserve the
        // system-wide critical ratio
        let mut fee = TokenAmount::ZERO;
        if debt_delta > 0 {
            let coll_after =
                apply_delta(self.system_collateral().base_units(), coll_delta, "collateral")?;
            let debt_after = safe_add(
                safe_add(self.system_debt().cents(), report.interest.cents())?,
                debt_delta as u64,
            )?;
            let tcr_after = self.tcr_with(coll_after, debt_after);
            if tcr_after < self.params.ccr {
                return Err(Error::InsufficientCollateralization {
                    current: tcr_after,
                    required: self.params.ccr,
                });
            }
            let fee_rate = self.fees.borrowing_rate(self.now, &self.params);
            fee = TokenAmount::from_cents(fee_on(debt_delta as u64, fee_rate)?);
        }
        if debt_delta < 0 {
            let repay = TokenAmount::from_cents(debt_delta.unsigned_abs());
            let balance = self.ledger.balance_of(owner);
            if balance < repay {
                return Err(Error::InsufficientBalance {
                    required: repay.cents(),
                    available: balance.cents(),
                });
            }
        }

        // All checks passed; settle and apply
        self.settle_position(id)?;
        if coll_delta > 0 {
            let added = CollateralAmount::from_base_units(coll_delta as u64);
            self.active.add_collateral(added);
            self.coll_in = self.coll_in.saturating_add(added);
        } else if coll_delta < 0 {
            let removed = CollateralAmount::from_base_units(coll_delta.unsigned_abs());
            self.active.remove_collateral(removed)?;
            self.coll_out = self.coll_out.saturating_add(removed);
        }
        if debt_delta > 0 {
            let minted = TokenAmount::from_cents(debt_delta as u64);
            self.active.add_debt(minted);
            self.ledger.mint(owner, minted.saturating_sub(fee))?;
            self.ledger.mint(AccountId::TREASURY, fee)?;
            self.fees.record_borrowing(fee);
        } else if debt_delta < 0 {
            let repaid = TokenAmount::from_cents(debt_delta.unsigned_abs());
            self.active.remove_debt(repaid)?;
            self.ledger.burn(owner, repaid)?;
        }

        let trove = self.registry.trove_mut(id)?;
        trove.collateral = CollateralAmount::from_base_units(new_coll);
        trove.debt = TokenAmount::from_cents(new_debt);
        self.registry.update_stake(id)?;

        debug!(%id, coll_delta, debt_delta, "trove adjusted");
        Ok(())
    }

    /// Close a trove: burn its full debt from the owner's balance and
    /// return all collateral
    pub fn close_trove(&mut self, id: TroveId) -> Result<()> {
        self.registry.active_trove(id)?;

        // The owner must cover the settled debt; check before mutating
        let report = self.registry.preview(id, self.now)?;
        let trove = self.registry.trove(id)?;
        let owner = trove.owner;
        let debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);

        let balance = self.ledger.balance_of(owner);
        if balance < debt {
            return Err(Error::InsufficientBalance {
                required: debt.cents(),
                available: balance.cents(),
            });
        }

        self.settle_position(id)?;
        let collateral = self.registry.trove(id)?.collateral;

        self.ledger.burn(owner, debt)?;
        self.active.remove_debt(debt)?;
        self.active.remove_collateral(collateral)?;
        self.coll_out = self.coll_out.saturating_add(collateral);
        self.registry.close_trove(id, TroveStatus::Closed)?;

        info!(%id, %owner, "trove closed");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BATCH OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create an interest-rate batch
    pub fn create_batch(&mut self, rate_bps: u64, management_fee_bps: u64) -> Result<BatchId> {
        self.check_rate(rate_bps)?;
        if management_fee_bps > self.params.max_management_fee_bps {
            return Err(Error::InvalidAmount {
                reason: format!(
                    "management fee {} bps above maximum {}",
                    management_fee_bps, self.params.max_management_fee_bps
                ),
            });
        }
        let id = self.registry.create_batch(rate_bps, management_fee_bps);
        info!(%id, rate_bps, management_fee_bps, "batch created");
        Ok(id)
    }

    /// Join a batch. The trove must clear the join ratio buffer on its
    /// settled position; it then settles at its old rate and accrues at
    /// the batch rate from there.
    pub fn join_batch(&mut self, id: TroveId, batch_id: BatchId) -> Result<()> {
        let price = self.require_price()?;
        self.registry.batch(batch_id)?;
        self.registry.active_trove(id)?;

        let trove = self.registry.trove(id)?;
        if trove.batch.is_some() {
            return Err(Error::InvalidState(format!("{} is already in a batch", id)));
        }

        // Check the buffer against the settled position before mutating
        let report = self.registry.preview(id, self.now)?;
        let settled_coll = trove.collateral.saturating_add(report.redist_coll);
        let settled_debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);
        let icr = collateral_ratio(settled_coll.base_units(), price, settled_debt.cents());
        let required = self.params.batch_join_ratio();
        if icr < required {
            return Err(Error::InsufficientCollateralization {
                current: icr,
                required,
            });
        }

        self.settle_position(id)?;
        self.registry.join_batch(id, batch_id)?;
        debug!(%id, %batch_id, "trove joined batch");
        Ok(())
    }

    /// Leave a batch, keeping the batch rate as the trove's personal rate
    pub fn leave_batch(&mut self, id: TroveId) -> Result<()> {
        let trove = self.registry.active_trove(id)?;
        if trove.batch.is_none() {
            return Err(Error::InvalidState(format!("{} is not in a batch", id)));
        }
        self.settle_position(id)?;
        self.registry.leave_batch(id)?;
        debug!(%id, "trove left batch");
        Ok(())
    }

    /// Settle all members of a batch, then mint the accrued management
    /// fees to the treasury. Returns the amount swept.
    pub fn sweep_batch_fees(&mut self, batch_id: BatchId) -> Result<TokenAmount> {
        let members: Vec<TroveId> =
            self.registry.batch(batch_id)?.members.iter().copied().collect();
        for member in members {
            self.settle_position(member)?;
        }

        let fees = self.registry.take_batch_fees(batch_id)?;
        self.ledger.mint(AccountId::TREASURY, fees)?;
        self.management_fees_minted = self.management_fees_minted.saturating_add(fees);

        info!(%batch_id, fees = fees.cents(), "batch fees swept");
        Ok(fees)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STABILITY POOL OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Move fUSD from the owner's balance into the stability pool. Any
    /// pending collateral gain is paid out and returned.
    pub fn provide_to_stability_pool(
        &mut self,
        owner: AccountId,
        amount: TokenAmount,
    ) -> Result<CollateralAmount> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount {
                reason: "stability deposit cannot be zero".into(),
            });
        }
        let balance = self.ledger.balance_of(owner);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.cents(),
                available: balance.cents(),
            });
        }

        let gain = self.stability.provide(owner, amount)?;
        self.ledger.transfer(owner, AccountId::STABILITY_POOL, amount)?;
        self.coll_out = self.coll_out.saturating_add(gain);

        debug!(%owner, amount = amount.cents(), gain = gain.base_units(), "stability deposit");
        Ok(gain)
    }

    /// Withdraw up to the realizable deposit; pays out pending collateral
    /// gains and returns them
    pub fn withdraw_from_stability_pool(
        &mut self,
        owner: AccountId,
        amount: TokenAmount,
    ) -> Result<CollateralAmount> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount {
                reason: "stability withdrawal cannot be zero".into(),
            });
        }

        let gain = self.stability.withdraw(owner, amount)?;
        self.ledger.transfer(AccountId::STABILITY_POOL, owner, amount)?;
        self.coll_out = self.coll_out.saturating_add(gain);

        debug!(%owner, amount = amount.cents(), gain = gain.base_units(), "stability withdrawal");
        Ok(gain)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TOKEN TRANSFERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Move fUSD between accounts
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        self.ledger.transfer(from, to, amount)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SURPLUS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Pay out collateral surplus left for an owner by a liquidation or
    /// full redemption
    pub fn claim_surplus(&mut self, owner: AccountId) -> Result<CollateralAmount> {
        let amount = self.surplus.claim(owner)?;
        self.coll_out = self.coll_out.saturating_add(amount);
        info!(%owner, amount = amount.base_units(), "surplus claimed");
        Ok(amount)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current logical time
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Current price, zero if never set
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Parameters this ledger runs with
    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Total fUSD supply
    pub fn total_supply(&self) -> TokenAmount {
        self.ledger.total_supply()
    }

    /// fUSD balance of an account
    pub fn balance_of(&self, owner: AccountId) -> TokenAmount {
        self.ledger.balance_of(owner)
    }

    /// Unclaimed collateral surplus of an owner
    pub fn surplus_of(&self, owner: AccountId) -> CollateralAmount {
        self.surplus.claimable(owner)
    }

    /// Ids of all active troves, in id order
    pub fn active_troves(&self) -> Vec<TroveId> {
        self.registry.active_trove_ids()
    }

    fn system_collateral(&self) -> CollateralAmount {
        self.active.collateral().saturating_add(self.default_pool.collateral())
    }

    fn system_debt(&self) -> TokenAmount {
        self.active.debt().saturating_add(self.default_pool.debt())
    }

    fn tcr_with(&self, collateral: u64, debt: u64) -> u64 {
        collateral_ratio(collateral, self.price, debt)
    }

    /// Total collateralization ratio of the system, as a percentage
    pub fn tcr(&self) -> u64 {
        self.tcr_with(self.system_collateral().base_units(), self.system_debt().cents())
    }

    /// A trove's position as of now: pending redistribution gains and
    /// interest included, nothing mutated
    pub fn trove_reading(&self, id: TroveId) -> Result<TroveReading> {
        let trove = self.registry.trove(id)?;
        let report = self.registry.preview(id, self.now)?;

        let collateral = trove.collateral.saturating_add(report.redist_coll);
        let debt = trove
            .debt
            .saturating_add(report.redist_debt)
            .saturating_add(report.interest);

        Ok(TroveReading {
            owner: trove.owner,
            collateral,
            debt,
            icr: collateral_ratio(collateral.base_units(), self.price, debt.cents()),
            rate_bps: trove.rate_bps,
            status: trove.status,
            batch: trove.batch,
        })
    }

    /// Aggregate view of a batch
    pub fn batch_reading(&self, id: BatchId) -> Result<BatchReading> {
        let batch = self.registry.batch(id)?;
        let mut total_debt = TokenAmount::ZERO;
        let mut total_collateral = CollateralAmount::ZERO;
        let mut pending_fees = batch.accrued_fees;

        for member in &batch.members {
            let reading = self.trove_reading(*member)?;
            total_debt = total_debt.saturating_add(reading.debt);
            total_collateral = total_collateral.saturating_add(reading.collateral);
            pending_fees =
                pending_fees.saturating_add(self.registry.preview(*member, self.now)?.management_fee);
        }

        Ok(BatchReading {
            rate_bps: batch.rate_bps,
            management_fee_bps: batch.management_fee_bps,
            member_count: batch.members.len(),
            total_debt,
            total_collateral,
            pending_fees,
        })
    }

    /// A depositor's stability pool position
    pub fn stability_reading(&self, owner: AccountId) -> StabilityReading {
        StabilityReading {
            deposit: self.stability.compounded_deposit(owner),
            collateral_gain: self.stability.collateral_gain(owner),
        }
    }

    /// Human-readable system summary
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "now": self.now,
            "price_cents": self.price,
            "total_supply_cents": self.ledger.total_supply().cents(),
            "active_troves": self.registry.active_count(),
            "active_collateral": self.active.collateral().base_units(),
            "active_debt_cents": self.active.debt().cents(),
            "pending_redistributed_debt_cents": self.default_pool.debt().cents(),
            "stability_deposits_cents": self.stability.total_deposits().cents(),
            "surplus_collateral": self.surplus.total().base_units(),
            "tcr_pct": self.tcr(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONSERVATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check the global accounting identities. Cheap enough to call after
    /// every transition in tests.
    pub fn check_conservation(&self) -> Result<()> {
        if !self.ledger.verify_supply_invariant() {
            return Err(Error::InvariantViolation(
                "token supply does not match the sum of balances".into(),
            ));
        }

        let backed = self
            .system_debt()
            .saturating_add(self.management_fees_minted);
        if self.ledger.total_supply() != backed {
            return Err(Error::InvariantViolation(format!(
                "supply {} != debt-backed {}",
                self.ledger.total_supply().cents(),
                backed.cents()
            )));
        }

        let held = self
            .system_collateral()
            .saturating_add(self.surplus.total())
            .saturating_add(self.stability.total_collateral());
        let net_in = safe_sub(self.coll_in.base_units(), self.coll_out.base_units())?;
        if held.base_units() != net_in {
            return Err(Error::InvariantViolation(format!(
                "collateral held {} != net inflow {}",
                held.base_units(),
                net_in
            )));
        }

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION HELPERS
    // ═══════════════════════════════════════════════════════════════════════════

    fn check_rate(&self, rate_bps: u64) -> Result<()> {
        if rate_bps < self.params.min_rate_bps || rate_bps > self.params.max_rate_bps {
            return Err(Error::InvalidAmount {
                reason: format!(
                    "interest rate {} bps outside [{}, {}]",
                    rate_bps, self.params.min_rate_bps, self.params.max_rate_bps
                ),
            });
        }
        Ok(())
    }
}

/// Apply a signed delta to an unsigned quantity
fn apply_delta(value: u64, delta: i64, what: &str) -> Result<u64> {
    if delta >= 0 {
        safe_add(value, delta as u64)
    } else {
        value
            .checked_sub(delta.unsigned_abs())
            .ok_or_else(|| Error::InvalidAmount {
                reason: format!("{} delta {} exceeds current {}", what, delta, value),
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// READINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// A trove's position as of now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TroveReading {
    /// Owning account
    pub owner: AccountId,
    /// Collateral including pending redistribution gains
    pub collateral: CollateralAmount,
    /// Debt including pending gains and accrued interest
    pub debt: TokenAmount,
    /// Collateralization ratio at the current price
    pub icr: u64,
    /// Annual interest rate in basis points
    pub rate_bps: u64,
    /// Lifecycle status
    pub status: TroveStatus,
    /// Batch membership
    pub batch: Option<BatchId>,
}

/// Aggregate view of a batch as of now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReading {
    /// Shared interest rate in basis points
    pub rate_bps: u64,
    /// Management fee in basis points
    pub management_fee_bps: u64,
    /// Number of member troves
    pub member_count: usize,
    /// Sum of member debts including pending accrual
    pub total_debt: TokenAmount,
    /// Sum of member collateral including pending gains
    pub total_collateral: CollateralAmount,
    /// Management fees accrued but not swept, including pending
    pub pending_fees: TokenAmount,
}

/// A stability depositor's position as of now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityReading {
    /// Realizable deposit value
    pub deposit: TokenAmount,
    /// Unrealized collateral gain
    pub collateral_gain: CollateralAmount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Serializable image of the whole ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot(Protocol);

impl LedgerSnapshot {
    /// Encode as opaque bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode from bytes produced by [`Self::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl Protocol {
    /// Capture the full ledger state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot(self.clone())
    }

    /// Rebuild a ledger from a snapshot
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        snapshot.0
    }
}
