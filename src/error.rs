// ============================================================================
// Errors - Prediction Market Ledger
// ============================================================================
//
// Every engine operation either succeeds or fails with exactly one of these
// kinds. Nothing is retried internally; callers own retry policy.
//
// ============================================================================

use serde::{Deserialize, Serialize};

/// Result type for ledger operations
pub type MarketResult<T> = Result<T, MarketError>;

/// Ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MarketError {
    #[error("Market not found: {0}")]
    NotFound(u64),

    #[error("Market duration must be positive")]
    InvalidDuration,

    #[error("Stake amount must be positive")]
    InvalidStake,

    #[error("Market {0} is not open for staking")]
    MarketNotOpen(u64),

    #[error("Staking window for market {0} has closed")]
    MarketExpired(u64),

    #[error("Stake too small: {amount} < minimum {min_stake}")]
    StakeTooSmall { amount: String, min_stake: String },

    #[error("Position on market {0} is held on the other outcome")]
    OutcomeMismatch(u64),

    #[error("Market {0} has not reached its end time")]
    NotYetEnded(u64),

    #[error("Market {0} is not open and cannot enter resolution")]
    AlreadyResolving(u64),

    #[error("Market {0} is not awaiting resolution")]
    NotResolving(u64),

    #[error("Market {0} is not final")]
    MarketNotFinal(u64),

    #[error("Market {0} is already final")]
    AlreadyFinal(u64),

    #[error("No position on market {0}")]
    NoPosition(u64),

    #[error("Position on market {0} already claimed")]
    AlreadyClaimed(u64),

    #[error("Amount out of range on market {0}")]
    AmountOverflow(u64),

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl MarketError {
    /// Stable machine-readable code for the boundary layer
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::NotFound(_) => "not_found",
            MarketError::InvalidDuration => "invalid_duration",
            MarketError::InvalidStake => "invalid_stake",
            MarketError::MarketNotOpen(_) => "market_not_open",
            MarketError::MarketExpired(_) => "market_expired",
            MarketError::StakeTooSmall { .. } => "stake_too_small",
            MarketError::OutcomeMismatch(_) => "outcome_mismatch",
            MarketError::NotYetEnded(_) => "not_yet_ended",
            MarketError::AlreadyResolving(_) => "already_resolving",
            MarketError::NotResolving(_) => "not_resolving",
            MarketError::MarketNotFinal(_) => "market_not_final",
            MarketError::AlreadyFinal(_) => "already_final",
            MarketError::NoPosition(_) => "no_position",
            MarketError::AlreadyClaimed(_) => "already_claimed",
            MarketError::AmountOverflow(_) => "amount_overflow",
            MarketError::InvalidOutcome(_) => "invalid_outcome",
            MarketError::InvalidConfig(_) => "invalid_config",
            MarketError::StorageError(_) => "storage_error",
        }
    }
}

impl From<sled::Error> for MarketError {
    fn from(e: sled::Error) -> Self {
        MarketError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(e: serde_json::Error) -> Self {
        MarketError::StorageError(format!("Failed to (de)serialize record: {}", e))
    }
}
