// Data models for the prediction market ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};

pub type MarketId = u64;
pub type UserId = String;

/// Fractional digits kept on computed payouts
pub const AMOUNT_SCALE: u32 = 18;

/// Side of a binary market a user can stake on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
}

impl Outcome {
    pub fn opposite(&self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Yes => write!(f, "yes"),
            Outcome::No => write!(f, "no"),
        }
    }
}

/// Resolved truth value of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketOutcome {
    #[default]
    #[serde(rename = "unset")]
    Unset,
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "void")]
    Void,
}

impl MarketOutcome {
    /// True when a stake on `side` backed this outcome
    pub fn matches(&self, side: Outcome) -> bool {
        matches!(
            (self, side),
            (MarketOutcome::Yes, Outcome::Yes) | (MarketOutcome::No, Outcome::No)
        )
    }

    pub fn winning_side(&self) -> Option<Outcome> {
        match self {
            MarketOutcome::Yes => Some(Outcome::Yes),
            MarketOutcome::No => Some(Outcome::No),
            _ => None,
        }
    }
}

impl From<Outcome> for MarketOutcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Yes => MarketOutcome::Yes,
            Outcome::No => MarketOutcome::No,
        }
    }
}

/// Market lifecycle: Open -> Resolving -> {Resolved, Invalid}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketState {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "resolving")]
    Resolving,
    #[serde(rename = "resolved")]
    Resolved,
    #[serde(rename = "invalid")]
    Invalid,
}

impl MarketState {
    /// Resolved or Invalid: payouts are defined and nothing moves any more
    pub fn is_final(&self) -> bool {
        matches!(self, MarketState::Resolved | MarketState::Invalid)
    }
}

/// A single binary-outcome proposition with a stake deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub question: String,
    pub description: String,
    pub creator: UserId,
    pub created_at: u64,
    /// Staking closes strictly before this instant
    pub end_time: u64,
    pub state: MarketState,
    pub outcome: MarketOutcome,
    pub total_yes_stake: Decimal,
    pub total_no_stake: Decimal,
    pub min_stake: Decimal,
    /// Set when the market enters Resolved or Invalid
    #[serde(default)]
    pub resolved_at: Option<u64>,
    #[serde(default)]
    pub void_reason: Option<String>,
}

impl Market {
    pub fn pool(&self, side: Outcome) -> Decimal {
        match side {
            Outcome::Yes => self.total_yes_stake,
            Outcome::No => self.total_no_stake,
        }
    }

    pub fn total_pool(&self) -> Decimal {
        self.total_yes_stake.saturating_add(self.total_no_stake)
    }

    /// Grows the `side` pool by `amount`. The combined pool must stay
    /// representable, otherwise nothing changes.
    pub(crate) fn add_to_pool(&mut self, side: Outcome, amount: Decimal) -> MarketResult<()> {
        let overflow = MarketError::AmountOverflow(self.id);
        self.total_yes_stake
            .checked_add(self.total_no_stake)
            .and_then(|total| total.checked_add(amount))
            .ok_or_else(|| overflow.clone())?;

        let pool = match side {
            Outcome::Yes => &mut self.total_yes_stake,
            Outcome::No => &mut self.total_no_stake,
        };
        *pool = pool.checked_add(amount).ok_or(overflow)?;
        Ok(())
    }
}

/// One user's position on one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub market_id: MarketId,
    pub user_id: UserId,
    /// Fixed by the first stake
    pub outcome: Outcome,
    /// Cumulative staked amount
    pub amount: Decimal,
    pub claimed: bool,
    /// Amount disbursed by the claim, recorded with the claimed flag
    #[serde(default)]
    pub payout: Option<Decimal>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub claimed_at: Option<u64>,
}

impl StakeRecord {
    pub fn new(market_id: MarketId, user_id: UserId, outcome: Outcome, amount: Decimal, now: u64) -> Self {
        Self {
            market_id,
            user_id,
            outcome,
            amount,
            claimed: false,
            payout: None,
            created_at: now,
            updated_at: now,
            claimed_at: None,
        }
    }
}

/// Tagged view of a user's position for the display layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", content = "amount")]
pub enum Position {
    #[serde(rename = "none")]
    NoPosition,
    #[serde(rename = "yes")]
    Yes(Decimal),
    #[serde(rename = "no")]
    No(Decimal),
}

impl From<Option<&StakeRecord>> for Position {
    fn from(record: Option<&StakeRecord>) -> Self {
        match record {
            None => Position::NoPosition,
            Some(r) => match r.outcome {
                Outcome::Yes => Position::Yes(r.amount),
                Outcome::No => Position::No(r.amount),
            },
        }
    }
}

/// Raw market figures for market cards; ratios are left to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub market: Market,
    pub total_pool: Decimal,
    pub participants: usize,
}

/// What a claim paid out for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimKind {
    #[serde(rename = "winnings")]
    Winnings,
    #[serde(rename = "loss")]
    Loss,
    #[serde(rename = "refund")]
    Refund,
}

/// Returned by a successful claim for disbursement by the wallet layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub id: String,
    pub market_id: MarketId,
    pub user_id: UserId,
    pub kind: ClaimKind,
    pub amount: Decimal,
    pub claimed_at: u64,
}
