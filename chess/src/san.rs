//! Standard Algebraic Notation for legal moves.

use chess_common::{format_file, format_piece_upper, format_rank, format_square, is_castling};
use cozy_chess::{Board, Move, Piece};

/// Format a legal move (cozy-chess encoding) as SAN, including the `+`/`#`
/// suffix.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = if is_castling(board, mv) {
        if mv.to.file() as usize > mv.from.file() as usize {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        piece_move(board, mv)
    };

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if after.generate_moves(|_| true) {
            san.push('+');
        } else {
            san.push('#');
        }
    }
    san
}

fn piece_move(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format!("{}{}", format_square(mv.from), format_square(mv.to));
    };
    let is_capture = board.color_on(mv.to) == Some(!board.side_to_move())
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    let mut san = String::new();
    if piece == Piece::Pawn {
        if is_capture {
            san.push(format_file(mv.from.file()));
        }
    } else {
        san.push(format_piece_upper(piece));
        san.push_str(&disambiguation(board, mv, piece));
    }
    if is_capture {
        san.push('x');
    }
    san.push_str(&format_square(mv.to));
    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(format_piece_upper(promo));
    }
    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals = Vec::new();
    board.generate_moves_for(board.pieces(piece), |mvs| {
        rivals.extend(mvs.into_iter().filter(|m| m.to == mv.to && m.from != mv.from));
        false
    });
    if rivals.is_empty() {
        return String::new();
    }
    let shares_file = rivals.iter().any(|m| m.from.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|m| m.from.rank() == mv.from.rank());
    match (shares_file, shares_rank) {
        (false, _) => format_file(mv.from.file()).to_string(),
        (true, false) => format_rank(mv.from.rank()).to_string(),
        (true, true) => format_square(mv.from),
    }
}
