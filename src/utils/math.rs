//! Safe integer arithmetic and collateral-ratio helpers.
//!
//! Amounts are u64 (cents and collateral base units); every product goes
//! through a u128 intermediate so the only failure mode is a genuine
//! overflow of the final result, reported as an invariant violation.

use crate::error::{Error, Result};
use crate::utils::constants::{BPS_DIVISOR, COLL_BASE_UNIT, RATIO_PRECISION};

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE ARITHMETIC OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| Error::InvariantViolation(format!("overflow in {} + {}", a, b)))
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b)
        .ok_or_else(|| Error::InvariantViolation(format!("underflow in {} - {}", a, b)))
}

/// Safe multiplication then division: (a * b) / c with a u128 intermediate
pub fn safe_mul_div(a: u64, b: u64, c: u64) -> Result<u64> {
    if c == 0 {
        return Err(Error::InvariantViolation(format!(
            "division by zero in ({} * {}) / 0",
            a, b
        )));
    }
    let result = (a as u128) * (b as u128) / (c as u128);
    if result > u64::MAX as u128 {
        return Err(Error::InvariantViolation(format!(
            "overflow in ({} * {}) / {}",
            a, b, c
        )));
    }
    Ok(result as u64)
}

/// Safe multiplication then division, rounding up
pub fn safe_mul_div_up(a: u64, b: u64, c: u64) -> Result<u64> {
    if c == 0 {
        return Err(Error::InvariantViolation(format!(
            "division by zero in ceil(({} * {}) / 0)",
            a, b
        )));
    }
    let numerator = (a as u128) * (b as u128);
    let result = (numerator + (c as u128) - 1) / (c as u128);
    if result > u64::MAX as u128 {
        return Err(Error::InvariantViolation(format!(
            "overflow in ceil(({} * {}) / {})",
            a, b, c
        )));
    }
    Ok(result as u64)
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERALIZATION CALCULATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Calculate a collateralization ratio as a percentage.
///
/// # Arguments
/// * `collateral` - collateral in base units
/// * `price_cents` - price of one whole collateral unit, in cents
/// * `debt_cents` - debt in cents
///
/// Returns e.g. 150 for 150%. Zero debt reads as an infinite ratio.
pub fn collateral_ratio(collateral: u64, price_cents: u64, debt_cents: u64) -> u64 {
    if debt_cents == 0 {
        return u64::MAX;
    }

    // ratio = collateral * price * 100 / (COLL_BASE_UNIT * debt)
    let numerator = (collateral as u128) * (price_cents as u128) * (RATIO_PRECISION as u128);
    let denominator = (COLL_BASE_UNIT as u128) * (debt_cents as u128);

    let ratio = numerator / denominator;
    if ratio > u64::MAX as u128 {
        return u64::MAX;
    }
    ratio as u64
}

/// Value of a collateral amount in cents at the given price
pub fn collateral_value(collateral: u64, price_cents: u64) -> Result<u64> {
    safe_mul_div(collateral, price_cents, COLL_BASE_UNIT)
}

/// Collateral base units whose value equals `debt_cents` at the given price,
/// rounded down
pub fn collateral_for_value(debt_cents: u64, price_cents: u64) -> Result<u64> {
    if price_cents == 0 {
        return Err(Error::InvalidAmount {
            reason: "price cannot be zero".into(),
        });
    }
    safe_mul_div(debt_cents, COLL_BASE_UNIT, price_cents)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEE CALCULATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Calculate a fee in basis points of an amount
pub fn fee_on(amount: u64, fee_bps: u64) -> Result<u64> {
    safe_mul_div(amount, fee_bps, BPS_DIVISOR)
}

/// Collateral seized for a liquidated debt: min of the trove's collateral and
/// the penalty-adjusted equivalent of the debt.
///
/// Returns `(seized, surplus)` where surplus is whatever the trove held above
/// the seize amount.
pub fn seize_amounts(
    collateral: u64,
    debt_cents: u64,
    price_cents: u64,
    penalty_bps: u64,
) -> Result<(u64, u64)> {
    // debt * (1 + penalty), in cents
    let debt_plus_penalty = safe_mul_div(debt_cents, BPS_DIVISOR + penalty_bps, BPS_DIVISOR)?;
    // converted to collateral base units
    let wanted = collateral_for_value(debt_plus_penalty, price_cents)?;

    let seized = wanted.min(collateral);
    let surplus = collateral - seized;
    Ok((seized, surplus))
}
