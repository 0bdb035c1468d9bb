//! Claim Processor - converts a final position into its payout, exactly once.
//!
//! The claimed flag and the recorded payout are committed under the market's
//! lock, so two racing claims for the same position yield one payout and one
//! `AlreadyClaimed`.

use crate::error::{MarketError, MarketResult};
use crate::market_resolve::{lock_book, MarketRegistry, PayoutCalculator};
use crate::models::{ClaimKind, ClaimReceipt, MarketId, MarketState};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ClaimProcessor {
    registry: Arc<MarketRegistry>,
    calculator: PayoutCalculator,
}

impl ClaimProcessor {
    pub fn new(registry: Arc<MarketRegistry>, calculator: PayoutCalculator) -> Self {
        Self { registry, calculator }
    }

    pub fn calculator(&self) -> &PayoutCalculator {
        &self.calculator
    }

    pub fn claim(&self, market_id: MarketId, user_id: &str, now: u64) -> MarketResult<ClaimReceipt> {
        let book = self.registry.book(market_id)?;
        let mut book = lock_book(&book)?;

        if !book.market.state.is_final() {
            return Err(MarketError::MarketNotFinal(market_id));
        }

        let record = book
            .stakes
            .get(user_id)
            .ok_or(MarketError::NoPosition(market_id))?;
        if record.claimed {
            warn!("⚠️ Duplicate claim by {} on market {}", user_id, market_id);
            return Err(MarketError::AlreadyClaimed(market_id));
        }

        let amount = self.calculator.compute_payout(&book.market, record)?;
        let kind = match book.market.state {
            MarketState::Invalid => ClaimKind::Refund,
            _ if book.market.outcome.matches(record.outcome) => ClaimKind::Winnings,
            _ => ClaimKind::Loss,
        };

        let mut record = record.clone();
        record.claimed = true;
        record.payout = Some(amount);
        record.claimed_at = Some(now);

        let market = book.market.clone();
        self.registry.commit(&mut book, market, Some(record))?;

        info!("💰 Claim: {} received {} from market {} ({:?})", user_id, amount, market_id, kind);
        Ok(ClaimReceipt {
            id: Uuid::new_v4().to_string(),
            market_id,
            user_id: user_id.to_string(),
            kind,
            amount,
            claimed_at: now,
        })
    }
}
