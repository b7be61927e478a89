//! Move resolution that can bend the rules.
//!
//! Legal moves are always applied through the engine. When the caller allows
//! it, an illegal move becomes a forced relocation of the piece. Kings are
//! never captured, created or removed on either path.

use chess_common::{convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_square};
use cozy_chess::{Move, Piece, Square};
use serde::{Deserialize, Serialize};

use crate::position::{Position, PositionError};
use crate::san::format_san;
use crate::types::{square_text, PieceKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no piece on {0}")]
    EmptySquare(String),
    #[error("the king on {0} cannot be captured")]
    KingCapture(String),
    #[error("a piece has to leave its square")]
    NullMove,
    #[error("{from}-{to} is not a legal move")]
    Illegal { from: String, to: String },
    #[error("{from}-{to} would leave an impossible position")]
    Unrepresentable { from: String, to: String },
}

/// A move as it was applied, in standard coordinates (castling as the
/// two-square king move).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    #[serde(with = "square_text")]
    pub from: Square,
    #[serde(with = "square_text")]
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
    pub forced: bool,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub position: Position,
    pub notation: String,
    pub was_forced: bool,
    pub played: PlayedMove,
    pub captured: Option<PieceKind>,
}

/// Resolve `from -> to` against `position`.
///
/// The legal path is tried first even when `allow_illegal` is set.
pub fn resolve_move(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
    allow_illegal: bool,
) -> Result<Resolution, ResolveError> {
    let board = position.board();

    let Some(moving) = board.piece_on(from) else {
        return Err(ResolveError::EmptySquare(format_square(from)));
    };
    if board.piece_on(to) == Some(Piece::King) {
        return Err(ResolveError::KingCapture(format_square(to)));
    }
    if from == to {
        return Err(ResolveError::NullMove);
    }

    let legal = position.legal_moves();
    if let Some(mv) = find_legal(&legal, from, to, promotion) {
        let captured = if chess_common::is_castling(board, mv) {
            None
        } else if let Some(piece) = board.piece_on(mv.to) {
            Some(piece.into())
        } else if moving == Piece::Pawn && from.file() != to.file() {
            Some(PieceKind::Pawn)
        } else {
            None
        };
        let standard = convert_cozy_castling_to_uci(board, mv);
        return Ok(Resolution {
            notation: format_san(board, mv),
            position: position.after_legal(mv),
            was_forced: false,
            played: PlayedMove {
                from: standard.from,
                to: standard.to,
                promotion: standard.promotion.map(Into::into),
                forced: false,
            },
            captured,
        });
    }

    if !allow_illegal {
        return Err(ResolveError::Illegal {
            from: format_square(from),
            to: format_square(to),
        });
    }

    let captured = board.piece_on(to).map(PieceKind::from);
    let next = position
        .relocate(from, to, promotion)
        .map_err(|e| match e {
            PositionError::EmptySquare(sq) => ResolveError::EmptySquare(format_square(sq)),
            _ => ResolveError::Unrepresentable {
                from: format_square(from),
                to: format_square(to),
            },
        })?;
    let promoted = next
        .piece_at(to)
        .filter(|(kind, _)| moving == Piece::Pawn && *kind != PieceKind::Pawn)
        .map(|(kind, _)| kind);

    Ok(Resolution {
        position: next,
        notation: format!("{}-{}*", format_square(from), format_square(to)),
        was_forced: true,
        played: PlayedMove {
            from,
            to,
            promotion: promoted,
            forced: true,
        },
        captured,
    })
}

fn find_legal(legal: &[Move], from: Square, to: Square, promotion: Option<Piece>) -> Option<Move> {
    let requested = convert_uci_castling_to_cozy(
        Move {
            from,
            to,
            promotion,
        },
        legal,
    );
    if legal.contains(&requested) {
        return Some(requested);
    }
    if promotion.is_none() {
        let queened = Move {
            promotion: Some(Piece::Queen),
            ..requested
        };
        if legal.contains(&queened) {
            return Some(queened);
        }
    }
    None
}
