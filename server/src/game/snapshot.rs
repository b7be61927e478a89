use chess::{DrawReason, Outcome, PieceColor, PlayedMove};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::{GameMode, GamePhase, GameRecord};
use crate::ai::Strategy;
use crate::duel::ChaosView;

/// Complete, immutable view of a game, produced inside its actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    pub fen: String,
    pub side_to_move: PieceColor,
    pub phase: GamePhase,
    pub is_check: bool,
    pub is_over: bool,
    pub outcome: Option<Outcome>,
    pub draw_reason: Option<DrawReason>,
    pub winner: Option<PieceColor>,
    pub move_history: Vec<PlayedMove>,
    pub move_notation_history: Vec<String>,
    pub ply_count: u32,
    pub mode: GameMode,
    pub last_comment: Option<String>,
    pub recent_comments: Vec<String>,
    pub status_text: String,
    pub chaos: Option<ChaosView>,
    pub last_ai_strategy: Option<Strategy>,
    pub ai_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&GameRecord> for GameSnapshot {
    fn from(record: &GameRecord) -> Self {
        let play = &record.play;
        Self {
            id: record.id.clone(),
            fen: play.position.to_fen(),
            side_to_move: play.side_to_move(),
            phase: record.phase(),
            is_check: play.position.is_check(),
            is_over: play.is_over,
            outcome: play.outcome,
            draw_reason: play.draw_reason,
            winner: play.winner,
            move_history: play.move_history.clone(),
            move_notation_history: play.move_notation_history.clone(),
            ply_count: play.ply_count,
            mode: record.mode.clone(),
            last_comment: record.last_comment.clone(),
            recent_comments: record.recent_comments.clone(),
            status_text: record.status_text.clone(),
            chaos: record.chaos.as_ref().map(ChaosView::from),
            last_ai_strategy: record.last_ai_strategy,
            ai_error: record.ai_error.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
