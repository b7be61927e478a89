use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::duel::TimeControl;
use crate::matchmaking::{JoinOutcome, QueueStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBody {
    pub player_id: String,
    pub display_name: String,
    #[serde(default)]
    pub time_control: TimeControl,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBody {
    pub player_id: String,
}

/// POST /matchmaking/join
pub async fn join(
    State(state): State<AppState>,
    body: Result<Json<JoinBody>, JsonRejection>,
) -> Result<Json<JoinOutcome>, ApiError> {
    let Json(req) = body?;
    let outcome = state
        .queue
        .join(&req.player_id, &req.display_name, req.time_control)
        .await?;
    Ok(Json(outcome))
}

/// POST /matchmaking/leave
pub async fn leave(
    State(state): State<AppState>,
    body: Result<Json<LeaveBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    state.queue.leave(&req.player_id).await?;
    Ok(Json(json!({ "status": "left" })))
}

/// GET /matchmaking/status/:player_id
pub async fn status(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<QueueStatus>, ApiError> {
    Ok(Json(state.queue.status(&player_id).await?))
}
