// HTTP request handlers for the prediction market ledger

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::app_state::{AppState, SharedState};
use crate::engine::PredictionEngine;
use crate::error::{MarketError, MarketResult};
use crate::market_resolve::NewMarket;
use crate::models::{MarketId, Outcome};

// ===== ERRORS =====

/// Engine errors plus the boundary-only failures
#[derive(Debug)]
pub enum ApiError {
    Market(MarketError),
    Unauthorized,
}

impl From<MarketError> for ApiError {
    fn from(e: MarketError) -> Self {
        ApiError::Market(e)
    }
}

pub fn status_for(error: &MarketError) -> StatusCode {
    match error {
        MarketError::NotFound(_) | MarketError::NoPosition(_) => StatusCode::NOT_FOUND,
        MarketError::InvalidDuration
        | MarketError::InvalidStake
        | MarketError::StakeTooSmall { .. }
        | MarketError::AmountOverflow(_)
        | MarketError::InvalidOutcome(_) => StatusCode::BAD_REQUEST,
        MarketError::MarketNotOpen(_)
        | MarketError::MarketExpired(_)
        | MarketError::OutcomeMismatch(_)
        | MarketError::NotYetEnded(_)
        | MarketError::AlreadyResolving(_)
        | MarketError::NotResolving(_)
        | MarketError::MarketNotFinal(_)
        | MarketError::AlreadyFinal(_)
        | MarketError::AlreadyClaimed(_) => StatusCode::CONFLICT,
        MarketError::InvalidConfig(_) | MarketError::StorageError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Market(e) => (status_for(&e), e.code(), e.to_string()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing or invalid x-admin-key".to_string(),
            ),
        };
        if status.is_server_error() {
            warn!("❌ {}: {}", code, message);
        }
        (
            status,
            Json(json!({ "success": false, "code": code, "error": message })),
        )
            .into_response()
    }
}

pub type ApiResult = Result<Json<Value>, ApiError>;

/// Runs an engine mutation on the blocking pool. Book locks and sled writes
/// are synchronous and must not stall the async workers.
pub async fn run_blocking<T, F>(state: &SharedState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&PredictionEngine) -> MarketResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || op(&state.engine))
        .await
        .map_err(|e| MarketError::StorageError(format!("ledger task failed: {}", e)))?
        .map_err(ApiError::from)
}

// ===== REQUEST TYPES =====

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub duration_secs: i64,
    pub min_stake: Decimal,
    pub creator: String,
}

#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub user_id: String,
    pub outcome: Outcome,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// ===== MARKET ENDPOINTS =====

/// GET /markets
/// Summaries of every open market, by id
pub async fn get_markets(State(state): State<SharedState>) -> ApiResult {
    let engine = &state.engine;
    let markets = engine
        .list_active_markets()?
        .into_iter()
        .map(|id| engine.market_summary(id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({
        "success": true,
        "count": markets.len(),
        "markets": markets,
    })))
}

/// POST /markets
pub async fn create_market(
    State(state): State<SharedState>,
    Json(request): Json<CreateMarketRequest>,
) -> ApiResult {
    let request = NewMarket {
        question: request.question,
        description: request.description,
        duration_secs: request.duration_secs,
        min_stake: request.min_stake,
        creator: request.creator,
    };
    let now = AppState::now();
    let market = run_blocking(&state, move |engine| {
        let id = engine.create_market(request, now)?;
        engine.get_market(id)
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "market_id": market.id,
        "market": market,
    })))
}

/// GET /markets/:id
pub async fn get_market(State(state): State<SharedState>, Path(id): Path<MarketId>) -> ApiResult {
    let summary = state.engine.market_summary(id)?;
    Ok(Json(json!({ "success": true, "market": summary })))
}

/// POST /markets/:id/stake
pub async fn place_stake(
    State(state): State<SharedState>,
    Path(id): Path<MarketId>,
    Json(request): Json<StakeRequest>,
) -> ApiResult {
    let now = AppState::now();
    let record = run_blocking(&state, move |engine| {
        engine.place_stake(id, &request.user_id, request.outcome, request.amount, now)
    })
    .await?;

    Ok(Json(json!({ "success": true, "position": record })))
}

/// POST /markets/:id/claim
pub async fn claim(
    State(state): State<SharedState>,
    Path(id): Path<MarketId>,
    Json(request): Json<ClaimRequest>,
) -> ApiResult {
    let now = AppState::now();
    let receipt = run_blocking(&state, move |engine| engine.claim(id, &request.user_id, now)).await?;
    Ok(Json(json!({ "success": true, "receipt": receipt })))
}

// ===== ACTIVITY & HEALTH =====

/// GET /activity?limit=N
pub async fn get_activity(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let entries = state.engine.recent_activity(query.limit.unwrap_or(100));
    Json(json!({
        "success": true,
        "count": entries.len(),
        "activity": entries,
    }))
}

pub async fn health_check() -> &'static str {
    "Prediction Market Ledger - Online ✅"
}
