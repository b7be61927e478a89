use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chess::PieceColor;
use serde::Deserialize;

use super::error::ApiError;
use super::{parse_promotion_field, parse_square_field, AppState};
use crate::duel::RpsChoice;
use crate::game::{ColorChoice, GameSnapshot, MoveInput, NewGame};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    #[default]
    Bot,
    Local,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    #[serde(default)]
    pub mode: GameKind,
    pub bot_id: Option<String>,
    pub player_name: Option<String>,
    pub player_color: Option<ColorChoice>,
    pub white_name: Option<String>,
    pub black_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
    #[serde(default)]
    pub use_chaos_token: bool,
}

#[derive(Debug, Deserialize)]
pub struct RpsBody {
    pub side: PieceColor,
    pub choice: RpsChoice,
}

/// POST /games
pub async fn create_game(
    State(state): State<AppState>,
    body: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GameSnapshot>), ApiError> {
    let Json(req) = body?;
    let new = match req.mode {
        GameKind::Bot => NewGame::VsAi {
            bot_id: req.bot_id,
            player_name: req.player_name,
            color: req.player_color.unwrap_or_default(),
        },
        GameKind::Local => NewGame::LocalDuel {
            white_name: req.white_name,
            black_name: req.black_name,
        },
    };
    let snapshot = state.games.create(new).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /games/:id
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let handle = state.games.get_handle(&id).await?;
    Ok(Json(handle.snapshot().await?))
}

/// POST /games/:id/move
pub async fn make_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Json(req) = body?;
    let input = MoveInput {
        from: parse_square_field("from", &req.from)?,
        to: parse_square_field("to", &req.to)?,
        promotion: parse_promotion_field(req.promotion.as_deref())?,
        use_chaos_token: req.use_chaos_token,
    };
    let handle = state.games.get_handle(&id).await?;
    Ok(Json(handle.make_move(input).await?))
}

/// POST /games/:id/ai-move
pub async fn retry_ai(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let handle = state.games.get_handle(&id).await?;
    Ok(Json(handle.retry_ai().await?))
}

/// POST /games/:id/resign
pub async fn resign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let handle = state.games.get_handle(&id).await?;
    Ok(Json(handle.resign().await?))
}

/// POST /games/:id/reset
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let handle = state.games.get_handle(&id).await?;
    Ok(Json(handle.reset().await?))
}

/// POST /games/:id/rps
pub async fn submit_rps(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RpsBody>, JsonRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Json(req) = body?;
    let handle = state.games.get_handle(&id).await?;
    Ok(Json(handle.submit_rps(req.side, req.choice).await?))
}
