/// Stake Ledger
///
/// Tracks every user's position on every market:
/// - One record per (market, user); repeat stakes grow the same record
/// - A position's side is fixed by its first stake
/// - The matching pool grows in the same commit as the record, under the
///   market's lock, so concurrent stakers never lose an update
///
/// Records are never deleted. They stay for audit and for stats.

use crate::error::{MarketError, MarketResult};
use crate::market_resolve::{lock_book, MarketRegistry};
use crate::models::{MarketId, MarketState, Outcome, Position, StakeRecord};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StakeLedger {
    registry: Arc<MarketRegistry>,
}

impl StakeLedger {
    pub fn new(registry: Arc<MarketRegistry>) -> Self {
        Self { registry }
    }

    /// Stake `amount` on `outcome`. Returns the updated position.
    pub fn place_stake(
        &self,
        market_id: MarketId,
        user_id: &str,
        outcome: Outcome,
        amount: Decimal,
        now: u64,
    ) -> MarketResult<StakeRecord> {
        let book = self.registry.book(market_id)?;
        let mut book = lock_book(&book)?;

        if book.market.state != MarketState::Open {
            return Err(MarketError::MarketNotOpen(market_id));
        }
        if now >= book.market.end_time {
            return Err(MarketError::MarketExpired(market_id));
        }

        let record = match book.stakes.get(user_id) {
            Some(existing) => {
                if existing.outcome != outcome {
                    warn!("⚠️ {} tried to switch sides on market {}", user_id, market_id);
                    return Err(MarketError::OutcomeMismatch(market_id));
                }
                if amount <= Decimal::ZERO {
                    return Err(MarketError::InvalidStake);
                }
                let mut record = existing.clone();
                record.amount = record
                    .amount
                    .checked_add(amount)
                    .ok_or(MarketError::AmountOverflow(market_id))?;
                record.updated_at = now;
                record
            }
            None => {
                if amount < book.market.min_stake {
                    return Err(MarketError::StakeTooSmall {
                        amount: amount.to_string(),
                        min_stake: book.market.min_stake.to_string(),
                    });
                }
                StakeRecord::new(market_id, user_id.to_string(), outcome, amount, now)
            }
        };

        let mut market = book.market.clone();
        market.add_to_pool(outcome, amount)?;
        self.registry.commit(&mut book, market, Some(record.clone()))?;

        info!(
            "🎯 Stake: {} put {} on {} in market {} (position {})",
            user_id, amount, outcome, market_id, record.amount
        );
        Ok(record)
    }

    pub fn get_position(&self, market_id: MarketId, user_id: &str) -> MarketResult<Option<StakeRecord>> {
        let book = self.registry.book(market_id)?;
        let book = lock_book(&book)?;
        Ok(book.stakes.get(user_id).cloned())
    }

    /// Tagged position for display
    pub fn position(&self, market_id: MarketId, user_id: &str) -> MarketResult<Position> {
        Ok(Position::from(self.get_position(market_id, user_id)?.as_ref()))
    }

    /// Every record a user holds, ordered by market id
    pub fn positions_for(&self, user_id: &str) -> MarketResult<Vec<StakeRecord>> {
        let mut records = Vec::new();
        for (_, book) in self.registry.all_books()? {
            if let Some(record) = lock_book(&book)?.stakes.get(user_id) {
                records.push(record.clone());
            }
        }
        records.sort_by_key(|r| r.market_id);
        debug!("{} holds {} positions", user_id, records.len());
        Ok(records)
    }
}
