//! Board state wrapper around cozy-chess.

use cozy_chess::{Board, BoardBuilder, Color, File, Move, Piece, Rank, Square};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::types::{PieceColor, PieceKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error(transparent)]
    Fen(#[from] FenError),
    #[error("no piece on {0}")]
    EmptySquare(Square),
    #[error("position cannot be represented: {0}")]
    Unrepresentable(String),
}

/// A complete board state. Serializes as a FEN string.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
}

impl Position {
    pub fn starting() -> Self {
        Self {
            board: Board::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        Ok(Self {
            board: parse_fen(fen)?,
        })
    }

    pub fn to_fen(&self) -> String {
        format_fen(&self.board)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn piece_at(&self, square: Square) -> Option<(PieceKind, PieceColor)> {
        let piece = self.board.piece_on(square)?;
        let color = self.board.color_on(square)?;
        Some((piece.into(), color.into()))
    }

    /// All legal moves in cozy-chess encoding (castling as king-takes-rook).
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    pub fn has_legal_moves(&self) -> bool {
        self.board.generate_moves(|_| true)
    }

    pub fn is_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn halfmove_clock(&self) -> u8 {
        self.board.halfmove_clock()
    }

    /// Hash used for repetition detection. Ignores the move counters.
    pub fn repetition_key(&self) -> u64 {
        self.board.hash()
    }

    /// Apply a move already known to be legal.
    pub(crate) fn after_legal(&self, mv: Move) -> Self {
        let mut board = self.board.clone();
        board.play_unchecked(mv);
        Self { board }
    }

    /// Same placement with a different side to move. En passant is dropped
    /// since it only ever belongs to the side that was about to move.
    pub fn with_side_to_move(&self, color: PieceColor) -> Result<Self, PositionError> {
        hand_turn(BoardBuilder::from_board(&self.board), color)
    }

    /// Move the piece on `from` to `to` without any rule checking and hand
    /// the turn to the other side.
    ///
    /// Whatever stood on `to` is removed. A pawn landing on its last rank
    /// promotes to `promotion` (queen by default). Castling rights that no
    /// longer match the king and rook squares are dropped.
    pub fn relocate(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<Self, PositionError> {
        let mut builder = BoardBuilder::from_board(&self.board);
        let (piece, color) = builder
            .square(from)
            .ok_or(PositionError::EmptySquare(from))?;
        let captured = builder.square(to);

        let placed = if piece == Piece::Pawn && to.rank() == last_rank(color) {
            match promotion {
                Some(p) if !matches!(p, Piece::Pawn | Piece::King) => p,
                _ => Piece::Queen,
            }
        } else {
            piece
        };

        *builder.square_mut(from) = None;
        *builder.square_mut(to) = Some((placed, color));
        sanitize_castle_rights(&mut builder, piece, color);

        builder.halfmove_clock = if captured.is_some() || piece == Piece::Pawn {
            0
        } else {
            builder.halfmove_clock.saturating_add(1).min(100)
        };
        if self.board.side_to_move() == Color::Black {
            builder.fullmove_number = builder.fullmove_number.saturating_add(1);
        }
        hand_turn(builder, self.side_to_move().opposite())
    }
}

fn hand_turn(mut builder: BoardBuilder, color: PieceColor) -> Result<Position, PositionError> {
    builder.side_to_move = color.into();
    builder.en_passant = None;
    build(builder)
}

fn build(builder: BoardBuilder) -> Result<Position, PositionError> {
    builder
        .build()
        .map(|board| Position { board })
        .map_err(|e| PositionError::Unrepresentable(format!("{e:?}")))
}

fn last_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

fn back_rank(color: Color) -> Rank {
    last_rank(!color)
}

fn sanitize_castle_rights(builder: &mut BoardBuilder, moved: Piece, mover: Color) {
    for color in [Color::White, Color::Black] {
        let back = back_rank(color);
        let king_on_back_rank = File::ALL
            .iter()
            .any(|&f| builder.square(Square::new(f, back)) == Some((Piece::King, color)));
        let rook_on = |file: Option<File>| {
            file.filter(|&f| builder.square(Square::new(f, back)) == Some((Piece::Rook, color)))
        };

        let current = builder.castle_rights(color).clone();
        let (short, long) = if !king_on_back_rank || (moved == Piece::King && mover == color) {
            (None, None)
        } else {
            (rook_on(current.short), rook_on(current.long))
        };

        let rights = builder.castle_rights_mut(color);
        rights.short = short;
        rights.long = long;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl From<Board> for Position {
    fn from(board: Board) -> Self {
        Self { board }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.to_fen() == other.to_fen()
    }
}

impl Eq for Position {}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_fen())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fen = String::deserialize(deserializer)?;
        Position::from_fen(&fen).map_err(serde::de::Error::custom)
    }
}
