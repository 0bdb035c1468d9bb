/// Prediction Market Ledger
/// Binary-outcome markets: stake pools, resolution, payouts, claims and stats.
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod claims;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod market_resolve;
pub mod models;
pub mod routes;
pub mod stats;
pub mod storage;

pub use app_state::{AppState, SharedState};
pub use claims::ClaimProcessor;
pub use config::EngineConfig;
pub use engine::{ActivityEntry, ActivityKind, PredictionEngine, MAX_ACTIVITY};
pub use error::{MarketError, MarketResult};
pub use ledger::StakeLedger;
pub use market_resolve::{MarketRegistry, NewMarket, PayoutCalculator, ResolutionEngine};
pub use models::{
    ClaimKind, ClaimReceipt, Market, MarketId, MarketOutcome, MarketState, MarketSummary,
    Outcome, Position, StakeRecord, UserId, AMOUNT_SCALE,
};
pub use stats::{LeaderboardEntry, StatsAggregator, UserStats};
pub use storage::{LedgerStore, MemoryStore, SledStore, Snapshot};
