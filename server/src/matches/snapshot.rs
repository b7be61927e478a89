use chess::{DrawReason, Outcome, PieceColor, PlayedMove};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::{ChatMessage, MatchRecord};
use crate::duel::{DuelPhase, RevealedRound, TimeControl};

/// A seat as clients see it. The pending RPS choice is never exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub player_id: String,
    pub display_name: String,
    pub time_remaining_ms: u64,
    pub rps_submitted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub room_id: String,
    pub time_control: TimeControl,
    pub white: SeatView,
    pub black: SeatView,
    pub phase: DuelPhase,
    pub round: u32,
    pub last_round: Option<RevealedRound>,
    pub rps_deadline: Option<DateTime<Utc>>,
    pub chaos_token_holder: Option<PieceColor>,
    pub chaos_token_used: bool,
    pub fen: String,
    pub side_to_move: PieceColor,
    pub is_check: bool,
    pub is_over: bool,
    pub outcome: Option<Outcome>,
    pub draw_reason: Option<DrawReason>,
    pub winner: Option<PieceColor>,
    pub move_history: Vec<PlayedMove>,
    pub move_notation_history: Vec<String>,
    pub ply_count: u32,
    pub draw_offered_by: Option<String>,
    pub chat_log: Vec<ChatMessage>,
    pub status_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchSnapshot {
    /// Snapshot with clocks as of `now`.
    pub fn at(record: &MatchRecord, now: DateTime<Utc>) -> Self {
        let seat = |side: PieceColor| {
            let s = record.seat(side);
            SeatView {
                player_id: s.player_id.clone(),
                display_name: s.display_name.clone(),
                time_remaining_ms: record.remaining_ms(side, now),
                rps_submitted: record.duel.has_chosen(side),
            }
        };
        let play = &record.play;
        Self {
            room_id: record.room_id.clone(),
            time_control: record.time_control,
            white: seat(PieceColor::White),
            black: seat(PieceColor::Black),
            phase: record.duel.phase,
            round: record.duel.round,
            last_round: record.duel.last_round,
            rps_deadline: record.rps_deadline,
            chaos_token_holder: record.duel.token_holder,
            chaos_token_used: record.duel.token_used,
            fen: play.position.to_fen(),
            side_to_move: play.side_to_move(),
            is_check: play.position.is_check(),
            is_over: play.is_over,
            outcome: play.outcome,
            draw_reason: play.draw_reason,
            winner: play.winner,
            move_history: play.move_history.clone(),
            move_notation_history: play.move_notation_history.clone(),
            ply_count: play.ply_count,
            draw_offered_by: record.draw_offered_by.clone(),
            chat_log: record.chat_log.clone(),
            status_text: record.status_text.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
