// Application state management

use crate::config::EngineConfig;
use crate::engine::PredictionEngine;
use crate::error::MarketResult;
use std::sync::Arc;
use tracing::info;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub engine: PredictionEngine,
    /// Shared secret the oracle/admin presents to resolve or void
    pub admin_key: Option<String>,
}

impl AppState {
    pub fn new(config: &EngineConfig) -> MarketResult<Self> {
        info!("🚀 Initializing prediction market ledger...");
        let engine = PredictionEngine::open(config)?;
        info!(
            "✅ Ledger ready: {} active markets, platform fee {}",
            engine.list_active_markets()?.len(),
            engine.payout_calculator().fee_rate()
        );

        Ok(Self {
            engine,
            admin_key: config.admin_key.clone(),
        })
    }

    pub fn from_engine(engine: PredictionEngine, admin_key: Option<String>) -> Self {
        Self { engine, admin_key }
    }

    /// Wall clock at the boundary; the engine itself only sees supplied times
    pub fn now() -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}
