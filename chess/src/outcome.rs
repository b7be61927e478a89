//! Terminal position detection.

use cozy_chess::{BitBoard, Piece};
use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::types::PieceColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Checkmate,
    Stalemate,
    Draw,
    Resigned,
    Timeout,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawReason {
    InsufficientMaterial,
    Repetition,
    FiftyMove,
    Agreement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub outcome: Outcome,
    pub draw_reason: Option<DrawReason>,
    pub winner: Option<PieceColor>,
}

impl Terminal {
    pub fn draw(reason: DrawReason) -> Self {
        Self {
            outcome: Outcome::Draw,
            draw_reason: Some(reason),
            winner: None,
        }
    }
}

/// Checks, in order: checkmate, stalemate, insufficient material, threefold
/// repetition, fifty-move rule.
///
/// `history` holds the repetition keys of every position reached so far,
/// including the current one.
pub fn detect_terminal(position: &Position, history: &[u64]) -> Option<Terminal> {
    if !position.has_legal_moves() {
        return Some(if position.is_check() {
            Terminal {
                outcome: Outcome::Checkmate,
                draw_reason: None,
                winner: Some(!position.side_to_move()),
            }
        } else {
            Terminal {
                outcome: Outcome::Stalemate,
                draw_reason: None,
                winner: None,
            }
        });
    }

    if insufficient_material(position) {
        return Some(Terminal::draw(DrawReason::InsufficientMaterial));
    }

    let key = position.repetition_key();
    if history.iter().filter(|&&k| k == key).count() >= 3 {
        return Some(Terminal::draw(DrawReason::Repetition));
    }

    if position.halfmove_clock() >= 100 {
        return Some(Terminal::draw(DrawReason::FiftyMove));
    }

    None
}

/// Neither side can ever deliver mate: bare kings, a single minor piece, or
/// bishops that all stand on one square color.
pub fn insufficient_material(position: &Position) -> bool {
    let board = position.board();
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    if knights.len() + bishops.len() <= 1 {
        return true;
    }
    knights.is_empty() && single_square_color(bishops)
}

fn single_square_color(bishops: BitBoard) -> bool {
    let mut shades = bishops
        .into_iter()
        .map(|sq| (sq.file() as usize + sq.rank() as usize) % 2);
    match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_move;
    use chess_common::parse_square;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn test_starting_position_not_terminal() {
        let p = Position::starting();
        assert_eq!(detect_terminal(&p, &[p.repetition_key()]), None);
    }

    #[test]
    fn test_checkmate_winner_is_mover() {
        let p = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let t = detect_terminal(&p, &[]).unwrap();
        assert_eq!(t.outcome, Outcome::Checkmate);
        assert_eq!(t.winner, Some(PieceColor::Black));
    }

    #[test]
    fn test_stalemate() {
        let p = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let t = detect_terminal(&p, &[]).unwrap();
        assert_eq!(t.outcome, Outcome::Stalemate);
        assert_eq!(t.winner, None);
    }

    #[test]
    fn test_insufficient_material() {
        assert!(insufficient_material(&pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(insufficient_material(&pos("4k3/8/8/8/8/8/8/4KN2 w - - 0 1")));
        // Both bishops on dark squares (c1 and f8).
        assert!(insufficient_material(&pos("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!insufficient_material(&pos("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1")));
        assert!(!insufficient_material(&pos("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));

        let t = detect_terminal(&pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1"), &[]).unwrap();
        assert_eq!(t, Terminal::draw(DrawReason::InsufficientMaterial));
    }

    #[test]
    fn test_threefold_repetition() {
        let mut p = Position::starting();
        let mut keys = vec![p.repetition_key()];
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        let mut last = None;
        for _ in 0..2 {
            for (from, to) in shuffle {
                let res = resolve_move(
                    &p,
                    parse_square(from).unwrap(),
                    parse_square(to).unwrap(),
                    None,
                    false,
                )
                .unwrap();
                p = res.position;
                keys.push(p.repetition_key());
                last = detect_terminal(&p, &keys);
            }
        }
        assert_eq!(last, Some(Terminal::draw(DrawReason::Repetition)));
    }

    #[test]
    fn test_fifty_move_rule() {
        let p = pos("4k3/8/8/8/8/8/4R3/4K3 w - - 100 80");
        let t = detect_terminal(&p, &[]).unwrap();
        assert_eq!(t, Terminal::draw(DrawReason::FiftyMove));
    }
}
