//! Error types for the ferrum protocol core.
//!
//! Every fallible operation in the crate returns one of the variants below.
//! Operations validate preconditions before mutating anything, so an error
//! always means the ledger was left untouched.

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the protocol core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Lookup Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A referenced entity (trove, batch, deposit, surplus claim) does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Identifier that failed to resolve
        id: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// An amount or rate parameter is outside its legal range
    #[error("invalid amount: {reason}")]
    InvalidAmount {
        /// Why the amount was rejected
        reason: String,
    },

    /// A collateral ratio check failed
    #[error("collateralization ratio {current}% below required {required}%")]
    InsufficientCollateralization {
        /// Ratio the operation would produce, as a percentage
        current: u64,
        /// Minimum acceptable ratio, as a percentage
        required: u64,
    },

    /// A balance or deposit cannot cover the requested amount
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the operation needs, in cents
        required: u64,
        /// Amount actually available, in cents
        available: u64,
    },

    /// The entity exists but is in the wrong lifecycle state for this operation
    #[error("invalid state: {0}")]
    InvalidState(String),

    // ═══════════════════════════════════════════════════════════════════
    // Engine Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A liquidation or redemption found no trove it could act on
    #[error("no eligible candidates")]
    NoEligibleCandidates,

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// An accounting identity broke or arithmetic overflowed
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Snapshot serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Snapshot deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Returns true for errors a caller can fix by changing its request
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::InvalidAmount { .. }
                | Error::InsufficientCollateralization { .. }
                | Error::InsufficientBalance { .. }
                | Error::InvalidState(_)
                | Error::NoEligibleCandidates
        )
    }

    /// Returns true if this error indicates corrupted internal state
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Lookup errors: 1xxx
            Error::NotFound { .. } => 1001,

            // Validation errors: 2xxx
            Error::InvalidAmount { .. } => 2001,
            Error::InsufficientCollateralization { .. } => 2002,
            Error::InsufficientBalance { .. } => 2003,
            Error::InvalidState(_) => 2004,

            // Engine errors: 3xxx
            Error::NoEligibleCandidates => 3001,

            // Internal errors: 9xxx
            Error::InvariantViolation(_) => 9001,
            Error::Serialization(_) => 9002,
            Error::Deserialization(_) => 9003,
        }
    }
}
