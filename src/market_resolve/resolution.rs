use super::markets::{lock_book, MarketRegistry};
use crate::error::{MarketError, MarketResult};
use crate::models::{MarketId, MarketOutcome, MarketState, Outcome};
use std::sync::Arc;
use tracing::{info, warn};

/// Applies authoritative outcomes to markets: Resolving -> Resolved, or
/// Open/Resolving -> Invalid. Truth comes from the oracle or an admin; this
/// only validates and applies the transition.
pub struct ResolutionEngine {
    registry: Arc<MarketRegistry>,
}

impl ResolutionEngine {
    pub fn new(registry: Arc<MarketRegistry>) -> Self {
        Self { registry }
    }

    /// Settle a market awaiting resolution on `outcome`. Irreversible.
    pub fn resolve(&self, market_id: MarketId, outcome: Outcome, now: u64) -> MarketResult<()> {
        let book = self.registry.book(market_id)?;
        let mut book = lock_book(&book)?;

        if book.market.state != MarketState::Resolving {
            warn!("⚠️ Resolve rejected: market {} is {:?}", market_id, book.market.state);
            return Err(MarketError::NotResolving(market_id));
        }

        let mut market = book.market.clone();
        market.state = MarketState::Resolved;
        market.outcome = MarketOutcome::from(outcome);
        market.resolved_at = Some(now);
        self.registry.commit(&mut book, market, None)?;

        info!("✅ Market {} resolved: {} wins", market_id, outcome);
        Ok(())
    }

    /// Void a market that cannot be resolved; every staker is refunded.
    /// `reason` is kept for the record only.
    pub fn void_market(&self, market_id: MarketId, reason: &str, now: u64) -> MarketResult<()> {
        let book = self.registry.book(market_id)?;
        let mut book = lock_book(&book)?;

        if book.market.state.is_final() {
            warn!("⚠️ Void rejected: market {} is already {:?}", market_id, book.market.state);
            return Err(MarketError::AlreadyFinal(market_id));
        }

        let mut market = book.market.clone();
        market.state = MarketState::Invalid;
        market.outcome = MarketOutcome::Void;
        market.resolved_at = Some(now);
        market.void_reason = Some(reason.to_string());
        self.registry.commit(&mut book, market, None)?;

        info!("🚫 Market {} voided: {}", market_id, reason);
        Ok(())
    }
}
