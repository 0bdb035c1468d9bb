// Prediction Market Ledger - Main Entry Point

use std::sync::Arc;

use predict_earn_ledger::{routes, AppState, EngineConfig, SharedState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("═══════════════════════════════════════════════");
    info!("     🎲 Prediction Market Ledger");
    info!("═══════════════════════════════════════════════");

    if config.admin_key.is_none() {
        warn!("⚠️ LEDGER_ADMIN_KEY is not set; close/resolve/void are disabled");
    }

    // Initialize application state
    let state: SharedState = match AppState::new(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("❌ Failed to open ledger: {}", e);
            std::process::exit(1);
        }
    };

    // Clone state for shutdown handler before moving into router
    let shutdown_state = state.clone();
    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };

    info!("🚀 SERVER RUNNING on http://{}", config.bind_addr);
    info!("📋 Available Endpoints:");
    info!("   GET  /markets                      - List open markets");
    info!("   POST /markets                      - Create market");
    info!("   GET  /markets/:id                  - Market details");
    info!("   POST /markets/:id/stake            - Stake on yes/no");
    info!("   POST /markets/:id/close            - Begin resolution (admin)");
    info!("   POST /markets/:id/resolve          - Resolve outcome (admin)");
    info!("   POST /markets/:id/void             - Void market (admin)");
    info!("   POST /markets/:id/claim            - Claim payout");
    info!("   GET  /markets/:id/positions/:user  - User position");
    info!("   GET  /users/:user/positions        - All positions of a user");
    info!("   GET  /users/:user/stats            - Profile stats");
    info!("   GET  /leaderboard                  - Leaderboard");
    info!("   GET  /activity                     - Recent ledger activity");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("❌ Failed to listen for shutdown signal: {}", e);
            }
            info!("🛑 Shutdown signal received...");
        })
        .await;

    if let Err(e) = served {
        error!("❌ Server error: {}", e);
    }

    match shutdown_state.engine.shutdown() {
        Ok(()) => info!("✅ State saved successfully"),
        Err(e) => error!("❌ Failed to flush ledger: {}", e),
    }
    info!("👋 Goodbye!");
}
