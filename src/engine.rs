/// Prediction Engine
///
/// The process-wide ledger object: created once at startup from config,
/// shared through `Arc`, flushed on shutdown. Wires the registry, stake
/// ledger, resolution engine, claim processor and stats aggregator together
/// and keeps a bounded journal of recent activity.

use crate::claims::ClaimProcessor;
use crate::config::EngineConfig;
use crate::error::MarketResult;
use crate::ledger::StakeLedger;
use crate::market_resolve::{MarketRegistry, NewMarket, PayoutCalculator, ResolutionEngine};
use crate::models::{ClaimReceipt, Market, MarketId, MarketSummary, Outcome, Position, StakeRecord};
use crate::stats::{LeaderboardEntry, StatsAggregator, UserStats};
use crate::storage::{open_store, LedgerStore, MemoryStore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Journal entries kept in memory
pub const MAX_ACTIVITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    MarketCreated,
    Stake,
    ResolutionStarted,
    MarketResolved,
    MarketVoided,
    Claim,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub kind: ActivityKind,
    pub market_id: MarketId,
    pub account: Option<String>,
    pub amount: Option<Decimal>,
    pub timestamp: u64,
}

impl ActivityEntry {
    /// One-line human readable form, e.g. for the server log
    pub fn describe(&self) -> String {
        let when = chrono::DateTime::from_timestamp(self.timestamp as i64, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string());
        let emoji = match self.kind {
            ActivityKind::MarketCreated => "📊",
            ActivityKind::Stake => "🎯",
            ActivityKind::ResolutionStarted => "⏳",
            ActivityKind::MarketResolved => "✅",
            ActivityKind::MarketVoided => "🚫",
            ActivityKind::Claim => "💰",
        };
        let mut line = format!("[{}] {} {:?} | market {}", when, emoji, self.kind, self.market_id);
        if let Some(account) = &self.account {
            line.push_str(&format!(" | {}", account));
        }
        if let Some(amount) = self.amount {
            line.push_str(&format!(" | {}", amount));
        }
        line
    }
}

pub struct PredictionEngine {
    registry: Arc<MarketRegistry>,
    stakes: StakeLedger,
    resolution: ResolutionEngine,
    claims: ClaimProcessor,
    stats: StatsAggregator,
    activity: Mutex<VecDeque<ActivityEntry>>,
}

impl PredictionEngine {
    /// Open the configured store and rebuild the ledger from it
    pub fn open(config: &EngineConfig) -> MarketResult<Self> {
        let store: Arc<dyn LedgerStore> = Arc::from(open_store(config.data_dir.as_deref())?);
        let engine = Self::with_store(store, config.fee_rate)?;
        match &config.data_dir {
            Some(dir) => info!("💾 Ledger persisted at {:?}", dir),
            None => warn!("⚠️ Ledger running in memory only"),
        }
        Ok(engine)
    }

    pub fn in_memory(fee_rate: Decimal) -> MarketResult<Self> {
        Self::with_store(Arc::new(MemoryStore), fee_rate)
    }

    pub fn with_store(store: Arc<dyn LedgerStore>, fee_rate: Decimal) -> MarketResult<Self> {
        let calculator = PayoutCalculator::new(fee_rate)?;
        let registry = Arc::new(MarketRegistry::restore(store)?);

        Ok(Self {
            stakes: StakeLedger::new(registry.clone()),
            resolution: ResolutionEngine::new(registry.clone()),
            claims: ClaimProcessor::new(registry.clone(), calculator),
            stats: StatsAggregator::new(registry.clone()),
            registry,
            activity: Mutex::new(VecDeque::new()),
        })
    }

    pub fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    pub fn payout_calculator(&self) -> &PayoutCalculator {
        self.claims.calculator()
    }

    // ===== MARKETS =====

    pub fn create_market(&self, request: NewMarket, now: u64) -> MarketResult<MarketId> {
        let creator = request.creator.clone();
        let id = self.registry.create_market(request, now)?;
        self.record(ActivityKind::MarketCreated, id, Some(creator), None, now);
        Ok(id)
    }

    pub fn begin_resolution(&self, market_id: MarketId, now: u64) -> MarketResult<()> {
        self.registry.begin_resolution(market_id, now)?;
        self.record(ActivityKind::ResolutionStarted, market_id, None, None, now);
        Ok(())
    }

    pub fn get_market(&self, market_id: MarketId) -> MarketResult<Market> {
        self.registry.get_market(market_id)
    }

    pub fn market_summary(&self, market_id: MarketId) -> MarketResult<MarketSummary> {
        self.registry.summary(market_id)
    }

    pub fn list_active_markets(&self) -> MarketResult<Vec<MarketId>> {
        self.registry.list_active_markets()
    }

    /// Amount the platform keeps from a final market
    pub fn platform_take(&self, market_id: MarketId) -> MarketResult<Decimal> {
        let market = self.registry.get_market(market_id)?;
        self.payout_calculator().platform_take(&market)
    }

    // ===== STAKES =====

    pub fn place_stake(
        &self,
        market_id: MarketId,
        user_id: &str,
        outcome: Outcome,
        amount: Decimal,
        now: u64,
    ) -> MarketResult<StakeRecord> {
        let record = self.stakes.place_stake(market_id, user_id, outcome, amount, now)?;
        self.record(ActivityKind::Stake, market_id, Some(user_id.to_string()), Some(amount), now);
        Ok(record)
    }

    pub fn get_position(&self, market_id: MarketId, user_id: &str) -> MarketResult<Option<StakeRecord>> {
        self.stakes.get_position(market_id, user_id)
    }

    pub fn position(&self, market_id: MarketId, user_id: &str) -> MarketResult<Position> {
        self.stakes.position(market_id, user_id)
    }

    pub fn positions_for(&self, user_id: &str) -> MarketResult<Vec<StakeRecord>> {
        self.stakes.positions_for(user_id)
    }

    // ===== RESOLUTION =====

    pub fn resolve(&self, market_id: MarketId, outcome: Outcome, now: u64) -> MarketResult<()> {
        self.resolution.resolve(market_id, outcome, now)?;
        self.record(ActivityKind::MarketResolved, market_id, None, None, now);
        Ok(())
    }

    pub fn void_market(&self, market_id: MarketId, reason: &str, now: u64) -> MarketResult<()> {
        self.resolution.void_market(market_id, reason, now)?;
        self.record(ActivityKind::MarketVoided, market_id, None, None, now);
        Ok(())
    }

    // ===== CLAIMS & STATS =====

    pub fn claim(&self, market_id: MarketId, user_id: &str, now: u64) -> MarketResult<ClaimReceipt> {
        let receipt = self.claims.claim(market_id, user_id, now)?;
        self.record(
            ActivityKind::Claim,
            market_id,
            Some(user_id.to_string()),
            Some(receipt.amount),
            now,
        );
        Ok(receipt)
    }

    pub fn user_stats(&self, user_id: &str) -> MarketResult<UserStats> {
        self.stats.user_stats(user_id)
    }

    pub fn leaderboard(&self, limit: usize) -> MarketResult<Vec<LeaderboardEntry>> {
        self.stats.leaderboard(limit)
    }

    // ===== ACTIVITY =====

    /// Most recent entries last
    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        match self.activity.lock() {
            Ok(log) => {
                let skip = log.len().saturating_sub(limit);
                log.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    fn record(
        &self,
        kind: ActivityKind,
        market_id: MarketId,
        account: Option<String>,
        amount: Option<Decimal>,
        timestamp: u64,
    ) {
        let entry = ActivityEntry {
            id: Uuid::new_v4().to_string(),
            kind,
            market_id,
            account,
            amount,
            timestamp,
        };
        // The journal is informational; a poisoned lock only loses history
        if let Ok(mut log) = self.activity.lock() {
            log.push_back(entry);
            if log.len() > MAX_ACTIVITY {
                log.pop_front();
            }
        }
    }

    /// Flush the store before the process exits
    pub fn shutdown(&self) -> MarketResult<()> {
        self.registry.flush()?;
        info!("💾 Ledger flushed");
        Ok(())
    }
}
