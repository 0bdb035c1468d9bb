// Per-user read routes: positions, profile stats, leaderboard

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::json;

use crate::app_state::SharedState;
use crate::handlers::{ApiResult, LimitQuery};
use crate::models::MarketId;

pub const DEFAULT_LEADERBOARD_SIZE: usize = 50;

/// GET /markets/:id/positions/:user
pub async fn get_position(
    State(state): State<SharedState>,
    Path((id, user)): Path<(MarketId, String)>,
) -> ApiResult {
    let record = state.engine.get_position(id, &user)?;
    let position = state.engine.position(id, &user)?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "user_id": user,
        "position": position,
        "record": record,
    })))
}

/// GET /users/:user/positions
pub async fn get_user_positions(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> ApiResult {
    let positions = state.engine.positions_for(&user)?;
    Ok(Json(json!({
        "success": true,
        "user_id": user,
        "count": positions.len(),
        "positions": positions,
    })))
}

/// GET /users/:user/stats
pub async fn get_user_stats(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> ApiResult {
    let stats = state.engine.user_stats(&user)?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /leaderboard?limit=N
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult {
    let entries = state
        .engine
        .leaderboard(query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE))?;
    Ok(Json(json!({ "success": true, "leaderboard": entries })))
}
