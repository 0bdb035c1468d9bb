// Routes module - organizes all HTTP endpoints
// Each sub-module handles a specific domain

pub mod admin;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

/// Build the router with all endpoints
pub fn router(state: SharedState) -> Router {
    Router::new()
        // ===== MARKET ENDPOINTS =====
        .route("/markets", get(get_markets).post(create_market))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/stake", post(place_stake))
        .route("/markets/:id/claim", post(claim))
        .route("/markets/:id/positions/:user", get(users::get_position))

        // ===== ORACLE / ADMIN ENDPOINTS =====
        .route("/markets/:id/close", post(admin::begin_resolution))
        .route("/markets/:id/resolve", post(admin::resolve))
        .route("/markets/:id/void", post(admin::void_market))

        // ===== PROFILE ENDPOINTS =====
        .route("/users/:user/positions", get(users::get_user_positions))
        .route("/users/:user/stats", get(users::get_user_stats))
        .route("/leaderboard", get(users::get_leaderboard))

        // ===== LEDGER ACTIVITY =====
        .route("/activity", get(get_activity))

        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))

        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
