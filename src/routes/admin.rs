// Oracle/admin routes: close staking, resolve, void
// Every call must carry the configured admin key in `x-admin-key`. Without a
// configured key these routes reject everything.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::app_state::{AppState, SharedState};
use crate::error::MarketError;
use crate::handlers::{run_blocking, ApiError, ApiResult};
use crate::models::{MarketId, Outcome};

// ===== REQUEST TYPES =====

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// "yes" or "no"
    pub outcome: String,
}

#[derive(Debug, Deserialize)]
pub struct VoidRequest {
    #[serde(default)]
    pub reason: String,
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.admin_key else {
        warn!("🔒 Rejected admin call: no admin key configured");
        return Err(ApiError::Unauthorized);
    };
    let presented = headers.get("x-admin-key").and_then(|v| v.to_str().ok());
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        warn!("🔒 Rejected admin call without a valid key");
        Err(ApiError::Unauthorized)
    }
}

fn parse_outcome(raw: &str) -> Result<Outcome, MarketError> {
    match raw.trim().to_lowercase().as_str() {
        "yes" => Ok(Outcome::Yes),
        "no" => Ok(Outcome::No),
        other => Err(MarketError::InvalidOutcome(other.to_string())),
    }
}

// ===== ROUTE HANDLERS =====

/// POST /markets/:id/close
/// Open -> Resolving once the end time has passed
pub async fn begin_resolution(
    State(state): State<SharedState>,
    Path(id): Path<MarketId>,
    headers: HeaderMap,
) -> ApiResult {
    authorize(&state, &headers)?;
    let now = AppState::now();
    let market = run_blocking(&state, move |engine| {
        engine.begin_resolution(id, now)?;
        engine.get_market(id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "market": market })))
}

/// POST /markets/:id/resolve
pub async fn resolve(
    State(state): State<SharedState>,
    Path(id): Path<MarketId>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let outcome = parse_outcome(&request.outcome)?;
    let now = AppState::now();
    let market = run_blocking(&state, move |engine| {
        engine.resolve(id, outcome, now)?;
        engine.get_market(id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "market": market })))
}

/// POST /markets/:id/void
pub async fn void_market(
    State(state): State<SharedState>,
    Path(id): Path<MarketId>,
    headers: HeaderMap,
    Json(request): Json<VoidRequest>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let now = AppState::now();
    let market = run_blocking(&state, move |engine| {
        engine.void_market(id, &request.reason, now)?;
        engine.get_market(id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "market": market })))
}
