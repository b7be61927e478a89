use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::{parse_promotion_field, parse_square_field, AppState};
use crate::duel::RpsChoice;
use crate::matches::{DrawAction, MatchSnapshot};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpsBody {
    pub player_id: String,
    pub choice: RpsChoice,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    pub player_id: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
    #[serde(default)]
    pub use_chaos_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBody {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawBody {
    pub player_id: String,
    pub action: DrawAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    pub player_id: String,
    pub message: String,
}

/// GET /matches/:room_id
pub async fn get_match(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let handle = state.matches.get_handle(&room_id).await?;
    Ok(Json(handle.snapshot().await?))
}

/// POST /matches/:room_id/rps
pub async fn submit_rps(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    body: Result<Json<RpsBody>, JsonRejection>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let Json(req) = body?;
    let handle = state.matches.get_handle(&room_id).await?;
    Ok(Json(handle.submit_rps(req.player_id, req.choice).await?))
}

/// POST /matches/:room_id/move
pub async fn make_move(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let Json(req) = body?;
    let from = parse_square_field("from", &req.from)?;
    let to = parse_square_field("to", &req.to)?;
    let promotion = parse_promotion_field(req.promotion.as_deref())?;
    let handle = state.matches.get_handle(&room_id).await?;
    let snapshot = handle
        .make_move(req.player_id, from, to, promotion, req.use_chaos_token)
        .await?;
    Ok(Json(snapshot))
}

/// POST /matches/:room_id/resign
pub async fn resign(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    body: Result<Json<PlayerBody>, JsonRejection>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let Json(req) = body?;
    let handle = state.matches.get_handle(&room_id).await?;
    Ok(Json(handle.resign(req.player_id).await?))
}

/// POST /matches/:room_id/draw
pub async fn draw(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    body: Result<Json<DrawBody>, JsonRejection>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let Json(req) = body?;
    let handle = state.matches.get_handle(&room_id).await?;
    Ok(Json(handle.draw(req.player_id, req.action).await?))
}

/// POST /matches/:room_id/chat
pub async fn chat(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let Json(req) = body?;
    let handle = state.matches.get_handle(&room_id).await?;
    Ok(Json(handle.chat(req.player_id, req.message).await?))
}
