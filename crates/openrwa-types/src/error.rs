//! Error types for the OpenRWA settlement engine.
//!
//! All errors use the `RWA_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Input validation
//! - 2xx: Authorization
//! - 3xx: Eligibility registry state
//! - 4xx: Valuation feed state
//! - 5xx: Economic guards
//! - 6xx: Lifecycle (pause)
//! - 7xx: External payment rail
//! - 8xx: Invariant violations
//! - 9xx: Configuration / internal

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Amount, Identity, Price, Role};

/// Central error enum for all OpenRWA operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RwaError {
    // =================================================================
    // Input Validation (1xx)
    // =================================================================
    /// An amount that must be positive was zero.
    #[error("RWA_ERR_100: Amount must be greater than zero")]
    ZeroAmount,

    /// The null identity was supplied where a participant is required.
    #[error("RWA_ERR_101: Invalid identity (null)")]
    InvalidIdentity,

    /// A duration that must be positive was zero.
    #[error("RWA_ERR_102: Duration must be greater than zero")]
    ZeroDuration,

    /// Fixed-point arithmetic exceeded the supported amount range.
    #[error("RWA_ERR_103: Amount overflow in {context}")]
    AmountOverflow { context: &'static str },

    // =================================================================
    // Authorization (2xx)
    // =================================================================
    /// Caller does not hold the role required by the operation.
    #[error("RWA_ERR_200: Unauthorized: {caller} is not {role}")]
    Unauthorized { role: Role, caller: Identity },

    /// Participant is not whitelisted or is frozen.
    #[error("RWA_ERR_201: Not eligible: {0}")]
    NotEligible(Identity),

    // =================================================================
    // Eligibility Registry (3xx)
    // =================================================================
    #[error("RWA_ERR_300: Already whitelisted: {0}")]
    AlreadyWhitelisted(Identity),

    #[error("RWA_ERR_301: Not whitelisted: {0}")]
    NotWhitelisted(Identity),

    #[error("RWA_ERR_302: Already frozen: {0}")]
    AlreadyFrozen(Identity),

    #[error("RWA_ERR_303: Not frozen: {0}")]
    NotFrozen(Identity),

    // =================================================================
    // Valuation Feed (4xx)
    // =================================================================
    /// The last attestation is older than the configured staleness bound.
    #[error(
        "RWA_ERR_400: Stale price: last attested {last_attested_at}, max staleness {max_staleness_secs}s"
    )]
    StalePrice {
        last_attested_at: DateTime<Utc>,
        max_staleness_secs: i64,
    },

    /// Price updates may never lower the price.
    #[error("RWA_ERR_401: Price decreased: current {current}, attempted {attempted}")]
    PriceDecreased { current: Price, attempted: Price },

    // =================================================================
    // Economic Guards (5xx)
    // =================================================================
    /// Conversion output fell below the caller's minimum.
    #[error("RWA_ERR_500: Slippage exceeded: actual {actual}, minimum {minimum}")]
    SlippageExceeded { actual: Amount, minimum: Amount },

    /// Payment reserve cannot cover the payout.
    #[error("RWA_ERR_501: Insufficient reserve: available {available}, required {required}")]
    InsufficientReserve { available: Amount, required: Amount },

    #[error("RWA_ERR_502: Daily invest cap exceeded: remaining {remaining}")]
    InvestCapExceeded { remaining: Amount },

    #[error("RWA_ERR_503: Daily redeem cap exceeded: remaining {remaining}")]
    RedeemCapExceeded { remaining: Amount },

    /// Holder has fewer value units than the operation moves.
    #[error("RWA_ERR_504: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// Spender's approved allowance is too small.
    #[error("RWA_ERR_505: Insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    // =================================================================
    // Lifecycle (6xx)
    // =================================================================
    /// Ledger is administratively paused.
    #[error("RWA_ERR_600: Ledger is paused")]
    Paused,

    /// Unpause requested on a ledger that is not paused.
    #[error("RWA_ERR_601: Ledger is not paused")]
    NotPaused,

    // =================================================================
    // External Payment Rail (7xx)
    // =================================================================
    /// Moving the payment asset in or out of custody failed.
    #[error("RWA_ERR_700: Payment transfer failed: {reason}")]
    PaymentTransferFailed { reason: String },

    // =================================================================
    // Invariants (8xx)
    // =================================================================
    /// Supply conservation invariant violated.
    #[error("RWA_ERR_800: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    #[error("RWA_ERR_900: Internal error: {0}")]
    Internal(String),

    #[error("RWA_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("RWA_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RwaError>;

impl From<serde_json::Error> for RwaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
