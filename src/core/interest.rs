//! Simple-interest accrual math.
//!
//! Interest is non-compounding: `interest = debt * rate * elapsed / YEAR`,
//! with the annual rate in basis points and everything computed through
//! u128 intermediates, rounding down. The same formula yields the batch
//! management fee with the fee rate in place of the interest rate.
//!
//! Accrual is idempotent: zero elapsed time yields zero interest, so
//! settling a trove twice at the same timestamp changes nothing.

use crate::utils::constants::{BPS_DIVISOR, ONE_YEAR_SECS};

/// Interest accrued on `debt_cents` at `rate_bps` annual over `elapsed_secs`
pub fn accrued_interest(debt_cents: u64, rate_bps: u64, elapsed_secs: u64) -> u64 {
    let numerator = (debt_cents as u128) * (rate_bps as u128) * (elapsed_secs as u128);
    let denominator = (BPS_DIVISOR as u128) * (ONE_YEAR_SECS as u128);
    // Bounded by debt * rate: fits u64 for any plausible debt and horizon
    (numerator / denominator) as u64
}
