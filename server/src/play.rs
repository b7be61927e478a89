//! Board, history and result fields shared by local games and online matches.

use chess::{
    detect_terminal, DrawReason, Outcome, PieceColor, PlayedMove, Position, Resolution, Terminal,
};
use serde::{Deserialize, Serialize};

use crate::error::GameError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub position: Position,
    pub is_over: bool,
    pub outcome: Option<Outcome>,
    pub draw_reason: Option<DrawReason>,
    pub winner: Option<PieceColor>,
    pub move_history: Vec<PlayedMove>,
    pub move_notation_history: Vec<String>,
    pub ply_count: u32,
    /// Repetition keys of every position reached, the current one included.
    pub repetition_keys: Vec<u64>,
}

impl Default for PlayState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayState {
    pub fn new() -> Self {
        let position = Position::starting();
        Self {
            repetition_keys: vec![position.repetition_key()],
            position,
            is_over: false,
            outcome: None,
            draw_reason: None,
            winner: None,
            move_history: Vec::new(),
            move_notation_history: Vec::new(),
            ply_count: 0,
        }
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.position.side_to_move()
    }

    pub fn ensure_ongoing(&self) -> Result<(), GameError> {
        if self.is_over {
            Err(GameError::GameAlreadyOver)
        } else {
            Ok(())
        }
    }

    /// Record a resolved move and end the game if the new position is
    /// terminal.
    pub fn apply(&mut self, resolution: Resolution) -> Option<Terminal> {
        self.position = resolution.position;
        self.move_history.push(resolution.played);
        self.move_notation_history.push(resolution.notation);
        self.ply_count += 1;
        self.repetition_keys.push(self.position.repetition_key());

        let terminal = detect_terminal(&self.position, &self.repetition_keys)?;
        self.finish(terminal.outcome, terminal.draw_reason, terminal.winner);
        Some(terminal)
    }

    pub fn finish(
        &mut self,
        outcome: Outcome,
        draw_reason: Option<DrawReason>,
        winner: Option<PieceColor>,
    ) {
        self.is_over = true;
        self.outcome = Some(outcome);
        self.draw_reason = draw_reason;
        self.winner = winner;
    }

    /// One-line description of the result, or of whose turn it is.
    pub fn summary(&self) -> String {
        let Some(outcome) = self.outcome else {
            let mut text = format!("{} to move.", title(self.side_to_move()));
            if self.position.is_check() {
                text.push_str(" Check!");
            }
            return text;
        };

        let winner = self.winner.map(title).unwrap_or("Nobody");
        let loser = self.winner.map(|w| title(!w)).unwrap_or("Nobody");
        match outcome {
            Outcome::Checkmate => format!("Checkmate. {winner} wins."),
            Outcome::Stalemate => "Stalemate. The game is drawn.".to_string(),
            Outcome::Draw => match self.draw_reason {
                Some(DrawReason::InsufficientMaterial) => {
                    "Draw by insufficient material.".to_string()
                }
                Some(DrawReason::Repetition) => "Draw by threefold repetition.".to_string(),
                Some(DrawReason::FiftyMove) => "Draw by the fifty-move rule.".to_string(),
                Some(DrawReason::Agreement) => "Draw agreed.".to_string(),
                None => "The game is drawn.".to_string(),
            },
            Outcome::Resigned => format!("{loser} resigned. {winner} wins."),
            Outcome::Timeout => format!("{loser} ran out of time. {winner} wins."),
            Outcome::Abandoned => "Abandoned before the game started.".to_string(),
        }
    }
}

pub fn title(color: PieceColor) -> &'static str {
    match color {
        PieceColor::White => "White",
        PieceColor::Black => "Black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{parse_square, resolve_move};

    fn play(state: &mut PlayState, from: &str, to: &str) -> Option<Terminal> {
        let res = resolve_move(
            &state.position,
            parse_square(from).unwrap(),
            parse_square(to).unwrap(),
            None,
            false,
        )
        .unwrap();
        state.apply(res)
    }

    #[test]
    fn test_apply_records_history() {
        let mut state = PlayState::new();
        assert!(play(&mut state, "e2", "e4").is_none());
        assert_eq!(state.ply_count, 1);
        assert_eq!(state.move_notation_history, vec!["e4".to_string()]);
        assert_eq!(state.repetition_keys.len(), 2);
        assert_eq!(state.summary(), "Black to move.");
    }

    #[test]
    fn test_fools_mate_finishes_game() {
        let mut state = PlayState::new();
        play(&mut state, "f2", "f3");
        play(&mut state, "e7", "e5");
        play(&mut state, "g2", "g4");
        let terminal = play(&mut state, "d8", "h4").unwrap();
        assert_eq!(terminal.outcome, Outcome::Checkmate);
        assert!(state.is_over);
        assert_eq!(state.winner, Some(PieceColor::Black));
        assert_eq!(state.summary(), "Checkmate. Black wins.");
        assert_eq!(state.ensure_ongoing(), Err(GameError::GameAlreadyOver));
    }

    #[test]
    fn test_resignation_summary() {
        let mut state = PlayState::new();
        state.finish(Outcome::Resigned, None, Some(PieceColor::Black));
        assert_eq!(state.summary(), "White resigned. Black wins.");
    }
}
