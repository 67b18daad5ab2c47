//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and
//! modification. Runtime-tunable values live in [`crate::core::config`];
//! these are their defaults plus the fixed precision scales.

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Base units per whole collateral unit (8 decimals)
pub const COLL_BASE_UNIT: u64 = 100_000_000;

// ═══════════════════════════════════════════════════════════════════════════════
// FUSD CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// fUSD decimals (stored as cents, 2 decimals for display)
pub const FUSD_DECIMALS: u8 = 2;

/// Base unit for fUSD (1 fUSD = 100 cents)
pub const FUSD_BASE_UNIT: u64 = 100;

/// Maximum fUSD supply (100 billion fUSD in cents)
pub const MAX_FUSD_SUPPLY: u64 = 100_000_000_000 * FUSD_BASE_UNIT;

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERALIZATION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum Collateralization Ratio (MCR) - 110%
/// Below this ratio an individual trove can be liquidated
pub const MIN_COLLATERAL_RATIO: u64 = 110;

/// Critical Collateralization Ratio (CCR) - 150%
/// Debt-increasing operations must not pull the system TCR below this
pub const CRITICAL_COLLATERAL_RATIO: u64 = 150;

/// Extra ratio buffer required to join an interest-rate batch - 10 points
pub const BATCH_JOIN_BUFFER: u64 = 10;

/// Ratio precision (percentage points, 100 = 100%)
pub const RATIO_PRECISION: u64 = 100;

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Liquidation penalty when the debt is offset against the stability pool - 5%
pub const SP_OFFSET_PENALTY_BPS: u64 = 500;

/// Liquidation penalty when the debt is redistributed to other troves - 10%
pub const REDISTRIBUTION_PENALTY_BPS: u64 = 1000;

/// Basis points divisor (10000 = 100%)
pub const BPS_DIVISOR: u64 = 10000;

// ═══════════════════════════════════════════════════════════════════════════════
// DEBT AND RATE LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum debt per trove - $500 (50000 cents)
pub const MIN_DEBT: u64 = 500 * FUSD_BASE_UNIT;

/// Minimum annual interest rate - 0.5% (50 basis points)
pub const MIN_ANNUAL_RATE_BPS: u64 = 50;

/// Maximum annual interest rate - 250% (25000 basis points)
pub const MAX_ANNUAL_RATE_BPS: u64 = 25_000;

/// Maximum batch management fee - 10% (1000 basis points)
pub const MAX_MANAGEMENT_FEE_BPS: u64 = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// FEE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Borrowing fee floor - 0.5% (50 basis points)
pub const BORROWING_FEE_FLOOR_BPS: u64 = 50;

/// Borrowing fee cap - 5% (500 basis points)
pub const BORROWING_FEE_CAP_BPS: u64 = 500;

/// Redemption fee floor - 0.5% (50 basis points)
pub const REDEMPTION_FEE_FLOOR_BPS: u64 = 50;

/// Redemption fee cap - 5% (500 basis points)
pub const REDEMPTION_FEE_CAP_BPS: u64 = 500;

/// Fee base rate decay half-life - 12 hours
pub const FEE_DECAY_HALF_LIFE_SECS: u64 = 12 * 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// TIME CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Seconds per year, the denominator of the simple-interest formula
pub const ONE_YEAR_SECS: u64 = 365 * 24 * 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// STABILITY POOL CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Precision of the stability pool product factor P
pub const SP_PRECISION: u128 = 1_000_000_000_000_000_000; // 10^18

/// Rescale factor applied when P shrinks below SP_PRECISION / SP_RESCALE
pub const SP_RESCALE: u128 = 1_000_000_000; // 10^9

/// Number of scale steps after which a deposit is treated as fully consumed
pub const SP_SCALE_SPAN: u64 = 2;

/// Remainder that can never be offset out of the pool - $1 (100 cents).
/// Keeps P strictly positive across any sequence of offsets.
pub const MIN_SP_REMAINDER: u64 = FUSD_BASE_UNIT;

// ═══════════════════════════════════════════════════════════════════════════════
// REDISTRIBUTION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Precision of the per-unit-stake redistribution accumulators
pub const REDIST_PRECISION: u128 = 1_000_000_000_000_000_000; // 10^18
