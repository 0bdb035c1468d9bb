// ============================================================================
// Stats Aggregator - Profiles & Leaderboard
// ============================================================================
//
// Read-only fold over stake records joined with their market's outcome.
// Nothing here writes ledger state; results can be recomputed at any time.
//
// Streaks only count markets that resolved Yes/No, ordered by resolution
// time. Voided markets count as predictions but neither extend nor break a
// streak.
//
// ============================================================================

use crate::error::MarketResult;
use crate::market_resolve::{lock_book, MarketRegistry};
use crate::models::{Market, MarketState, StakeRecord, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: UserId,
    /// Payouts received on winning claims
    pub total_earnings: Decimal,
    /// Refunds received from voided markets
    pub total_refunded: Decimal,
    pub total_staked: Decimal,
    pub total_predictions: u64,
    pub correct_predictions: u64,
    /// correct / total, 0 with no predictions
    pub win_rate: Decimal,
    pub current_streak: u64,
    pub longest_streak: u64,
    /// Positions on markets still Open or Resolving
    pub active_positions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub stats: UserStats,
}

pub struct StatsAggregator {
    registry: Arc<MarketRegistry>,
}

impl StatsAggregator {
    pub fn new(registry: Arc<MarketRegistry>) -> Self {
        Self { registry }
    }

    pub fn user_stats(&self, user_id: &str) -> MarketResult<UserStats> {
        let mut history = Vec::new();
        for (_, book) in self.registry.all_books()? {
            let book = lock_book(&book)?;
            if let Some(record) = book.stakes.get(user_id) {
                history.push((book.market.clone(), record.clone()));
            }
        }
        Ok(fold_stats(user_id, history))
    }

    /// Every staker ranked by earnings, then win rate, then id
    pub fn leaderboard(&self, limit: usize) -> MarketResult<Vec<LeaderboardEntry>> {
        let mut histories: HashMap<UserId, Vec<(Market, StakeRecord)>> = HashMap::new();
        for (_, book) in self.registry.all_books()? {
            let book = lock_book(&book)?;
            for record in book.stakes.values() {
                histories
                    .entry(record.user_id.clone())
                    .or_default()
                    .push((book.market.clone(), record.clone()));
            }
        }

        let mut ranked: Vec<UserStats> = histories
            .into_iter()
            .map(|(user, history)| fold_stats(&user, history))
            .collect();

        ranked.sort_by(|a, b| {
            b.total_earnings
                .cmp(&a.total_earnings)
                .then(b.win_rate.cmp(&a.win_rate))
                .then(a.user_id.cmp(&b.user_id))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, stats)| LeaderboardEntry { rank: i + 1, stats })
            .collect())
    }
}

fn fold_stats(user_id: &str, history: Vec<(Market, StakeRecord)>) -> UserStats {
    let mut stats = UserStats {
        user_id: user_id.to_string(),
        ..UserStats::default()
    };
    let mut resolved: Vec<(u64, u64, bool)> = Vec::new();

    for (market, record) in &history {
        stats.total_staked = stats.total_staked.saturating_add(record.amount);

        if !market.state.is_final() {
            stats.active_positions += 1;
            continue;
        }

        stats.total_predictions += 1;
        let correct = market.outcome.matches(record.outcome);
        if correct {
            stats.correct_predictions += 1;
        }

        if record.claimed {
            let paid = record.payout.unwrap_or(Decimal::ZERO);
            match market.state {
                MarketState::Invalid => {
                    stats.total_refunded = stats.total_refunded.saturating_add(paid)
                }
                _ if correct => stats.total_earnings = stats.total_earnings.saturating_add(paid),
                _ => {}
            }
        }

        if market.state == MarketState::Resolved {
            resolved.push((market.resolved_at.unwrap_or(market.end_time), market.id, correct));
        }
    }

    if stats.total_predictions > 0 {
        stats.win_rate =
            Decimal::from(stats.correct_predictions) / Decimal::from(stats.total_predictions);
    }

    resolved.sort_unstable();
    let mut run = 0;
    for (_, _, correct) in &resolved {
        run = if *correct { run + 1 } else { 0 };
        stats.longest_streak = stats.longest_streak.max(run);
    }
    stats.current_streak = resolved
        .iter()
        .rev()
        .take_while(|(_, _, correct)| *correct)
        .count() as u64;

    stats
}
