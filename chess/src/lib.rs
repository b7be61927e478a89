//! Rules layer for Unfair Chess.
//!
//! Wraps cozy-chess behind [`Position`], produces SAN notation, resolves
//! moves that may break the rules ([`resolve_move`]) and detects terminal
//! positions ([`detect_terminal`]).

pub mod fen;
pub mod outcome;
pub mod position;
pub mod resolver;
pub mod san;
pub mod types;

pub use chess_common::{format_square, parse_promotion, parse_square};
pub use fen::FenError;
pub use outcome::{detect_terminal, DrawReason, Outcome, Terminal};
pub use position::{Position, PositionError};
pub use resolver::{resolve_move, PlayedMove, Resolution, ResolveError};
pub use san::format_san;
pub use types::{PieceColor, PieceKind};

pub use cozy_chess::{Move, Piece, Square};
