//! HTTP surface: JSON over axum, camelCase bodies.

pub mod error;
pub mod games;
pub mod matches;
pub mod matchmaking;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use chess::{parse_promotion, parse_square};
use cozy_chess::{Piece, Square};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ai::{catalogue, BotInfo};
use crate::game::GameManager;
use crate::matches::MatchManager;
use crate::matchmaking::Matchmaker;
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameManager>,
    pub matches: Arc<MatchManager>,
    pub queue: Arc<Matchmaker>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/bots", get(list_bots))
        .route("/games", post(games::create_game))
        .route("/games/:id", get(games::get_game))
        .route("/games/:id/move", post(games::make_move))
        .route("/games/:id/ai-move", post(games::retry_ai))
        .route("/games/:id/resign", post(games::resign))
        .route("/games/:id/reset", post(games::reset))
        .route("/games/:id/rps", post(games::submit_rps))
        .route("/matchmaking/join", post(matchmaking::join))
        .route("/matchmaking/leave", post(matchmaking::leave))
        .route("/matchmaking/status/:player_id", get(matchmaking::status))
        .route("/matches/:room_id", get(matches::get_match))
        .route("/matches/:room_id/rps", post(matches::submit_rps))
        .route("/matches/:room_id/move", post(matches::make_move))
        .route("/matches/:room_id/resign", post(matches::resign))
        .route("/matches/:room_id/draw", post(matches::draw))
        .route("/matches/:room_id/chat", post(matches::chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /bots
async fn list_bots() -> Json<Vec<BotInfo>> {
    Json(catalogue().iter().map(BotInfo::from).collect())
}

pub(crate) fn parse_square_field(field: &str, value: &str) -> Result<Square, ApiError> {
    parse_square(value.trim())
        .ok_or_else(|| ApiError::bad_request(format!("{field}: invalid square {value:?}")))
}

pub(crate) fn parse_promotion_field(value: Option<&str>) -> Result<Option<Piece>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_promotion(v)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("promotion: invalid piece {v:?}"))),
    }
}
